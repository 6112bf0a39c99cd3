// Keyless login walkthrough.
// --------------------------
// 1) Generate an ephemeral key and print an OAuth authorization URL whose
//    nonce commits to it
// 2) After the user signs in, read the returned ID token from the env
// 3) Fetch pepper and proof, derive the account and sign a transfer
//
// Run (step 1 prints the key material to export for step 2):
//   KEYLESS_NETWORK=devnet KEYLESS_CLIENT_ID=<oauth client id> \
//   cargo run --example keyless_login
//
//   KEYLESS_NETWORK=devnet KEYLESS_JWT=eyJ... \
//   KEYLESS_EPK_SECRET=0x.. KEYLESS_EPK_EXPIRY=.. KEYLESS_EPK_BLINDER=0x.. \
//   cargo run --example keyless_login
//
// Optional env:
//   KEYLESS_REDIRECT_URI (default: http://localhost:8080/callback)
//   RUST_LOG             (e.g. keyless_sdk=debug)

use std::env;

use keyless_sdk::tx::catalog;
use keyless_sdk::utils::bytes::{hex_decode, hex_encode, hex_to_exact};
use keyless_sdk::utils::now_secs;
use keyless_sdk::{DeriveAccountArgs, EphemeralKeyPair, Jwt, KeylessClient, KeylessConfig, RawTransaction};
use serde_json::json;
use url::Url;

const GOOGLE_AUTH: &str = "https://accounts.google.com/o/oauth2/v2/auth";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = KeylessClient::new(KeylessConfig::from_env()?)?;

    let Ok(token) = env::var("KEYLESS_JWT") else {
        let ekp = client.generate_ephemeral_key_pair(None)?;
        let client_id = env::var("KEYLESS_CLIENT_ID")?;
        let redirect =
            env::var("KEYLESS_REDIRECT_URI").unwrap_or_else(|_| "http://localhost:8080/callback".to_string());
        let url = Url::parse_with_params(
            GOOGLE_AUTH,
            &[
                ("client_id", client_id.as_str()),
                ("redirect_uri", redirect.as_str()),
                ("response_type", "id_token"),
                ("scope", "openid email"),
                ("nonce", ekp.nonce()),
            ],
        )?;
        println!("Sign in at:\n  {url}\n");
        println!("Then export:");
        println!("  KEYLESS_EPK_SECRET={}", hex_encode(ekp.private_key_bytes()));
        println!("  KEYLESS_EPK_EXPIRY={}", ekp.expiry_date_secs());
        println!("  KEYLESS_EPK_BLINDER={}", hex_encode(ekp.blinder()));
        return Ok(());
    };

    let secret: [u8; 32] = hex_to_exact(&env::var("KEYLESS_EPK_SECRET")?)?;
    let expiry: u64 = env::var("KEYLESS_EPK_EXPIRY")?.parse()?;
    let blinder = hex_decode(&env::var("KEYLESS_EPK_BLINDER")?)?;
    let ekp = EphemeralKeyPair::from_parts(secret, expiry, &blinder)?;

    let account = client
        .derive_keyless_account(DeriveAccountArgs::new(Jwt::parse(token.trim())?, ekp))
        .await?;
    println!("address: {}", account.address());

    let payload = catalog::entry_payload("0x1::aptos_account::transfer", &[], vec![json!("0x1"), json!(1)])?;
    let raw = RawTransaction::new(account.address(), 0, payload, 2_000, 100, now_secs() + 600, 4);
    let signed = account.sign_transaction(raw)?;
    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(())
}
