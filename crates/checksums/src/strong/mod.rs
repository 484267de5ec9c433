//! Strong (cryptographic) digests.
//!
//! Only MD5 is provided. It is not collision resistant, but it is the
//! fingerprint format downstream manifests expect next to each compressed
//! file (`<hex>  <name>`).

mod md5;

pub use md5::{BLOCK_LEN, DIGEST_LEN, Md5};

/// Renders `bytes` as hexadecimal, lowercase unless `upper` is set.
#[must_use]
pub fn to_hex(bytes: &[u8], upper: bool) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        if upper {
            write!(&mut out, "{byte:02X}").expect("write! to String cannot fail");
        } else {
            write!(&mut out, "{byte:02x}").expect("write! to String cannot fail");
        }
    }
    out
}
