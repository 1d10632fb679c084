//! Decrypts a value produced by `lib_utils::crypt::encrypt`, reading
//! `SERVICE_ENCRYPT_KEY` from the environment/.env file.
use std::env;

use lib_utils::crypt;

fn main() {
    dotenvy::dotenv().ok();
    let value = env::args().nth(1).expect("usage: decrypt <encrypted-value>");
    match crypt::decrypt(&value) {
        Ok(plain) => println!("{plain}"),
        Err(e) => {
            eprintln!("decrypt failed: {e}");
            std::process::exit(1);
        }
    }
}
