//! Generates a random key suitable for `SERVICE_ENCRYPT_KEY`, base64url-encoded.
use lib_utils::b64::b64u_encode;
use rand::RngCore;

fn main() {
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    println!("{}", b64u_encode(key));
}
