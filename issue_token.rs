//! Mint a bearer token for local testing
//!
//! ```text
//! linkup-token <user-id> [email]
//! ```
//!
//! The token is signed with the configured `JWT_SECRET` and printed on
//! stdout, ready for `Authorization: Bearer <token>` or `/socket?token=`.

use linkup::backend::auth::create_token;
use linkup::shared::ChatConfig;
use uuid::Uuid;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let Some(raw_id) = args.next() else {
        eprintln!("usage: linkup-token <user-id> [email]");
        std::process::exit(2);
    };
    let user_id = Uuid::parse_str(raw_id.trim())?;
    let email = args.next();

    let config = ChatConfig::load()?;
    let token = create_token(&config.jwt_secret, user_id, email)?;
    println!("{}", token);
    Ok(())
}
