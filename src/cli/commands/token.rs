use anyhow::Context;
use clap::Args;

use crate::auth::{generate_token, Claims};
use crate::config;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "Tenant identity to embed as the bucket claim")]
    pub bucket: String,

    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs) -> anyhow::Result<()> {
    let config = config::config();
    if args.bucket.is_empty() {
        anyhow::bail!("bucket must not be empty");
    }

    let hours = args.hours.unwrap_or(config.security.jwt_expiry_hours);
    let claims = Claims::new(args.bucket, hours);
    let token = generate_token(&claims, &config.security.private_key)
        .context("failed to sign token; is GATEWAY_PRIVATE_KEY set?")?;

    println!("{}", token);
    Ok(())
}
