use account_builder::{AccountArgs, MultisigAccount, UserOperation};
use alloy_primitives::{Address, B256, Bytes, U256};
use clap::Parser;
use dotenvy::dotenv;
use eyre::{Result, WrapErr, bail};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Build and sign a multisig account user operation")]
struct Args {
    #[command(flatten)]
    account: AccountArgs,

    /// Call target. Repeat to build an `executeBatch` operation.
    #[arg(long, required = true)]
    to: Vec<Address>,

    /// Wei sent with the call. Only valid for a single target.
    #[arg(long, default_value = "0")]
    value: U256,

    /// Calldata, one per target. Defaults to empty calldata for a single target.
    #[arg(long)]
    data: Vec<Bytes>,

    /// Submit the operation through `eth_sendUserOperation`
    #[arg(long, default_value = "false")]
    send: bool,

    #[arg(long, env, default_value = "info")]
    log_level: Level,

    /// Format for logs, can be json or text
    #[arg(long, env, default_value = "text")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let log_format = args.log_format.to_lowercase();
    let log_level = args.log_level.to_string();

    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::new(log_level))
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(log_level))
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = args.account.validate()?;
    let account =
        MultisigAccount::init(config, None).await.wrap_err("failed to initialize account")?;

    let builder = if args.to.len() == 1 && args.data.len() <= 1 {
        let data = args.data.into_iter().next().unwrap_or_default();
        account.execute(args.to[0], args.value, data)
    } else {
        if !args.value.is_zero() {
            bail!("--value is not supported for batch operations");
        }
        account.execute_batch(args.to, args.data)?
    };

    let op = builder.build().await.wrap_err("failed to build user operation")?;

    let hash = if args.send {
        let hash =
            account.send_user_operation(&op).await.wrap_err("failed to send user operation")?;
        info!(user_op_hash = %hash, sender = %op.sender, "user operation submitted");
        Some(hash)
    } else {
        None
    };

    println!("{}", render(&op, hash)?);

    Ok(())
}

/// Pretty JSON of `op`, followed by the user operation hash on its own line once submitted
fn render(op: &UserOperation, hash: Option<B256>) -> Result<String> {
    let mut out = serde_json::to_string_pretty(op)?;
    if let Some(hash) = hash {
        out.push('\n');
        out.push_str(&hash.to_string());
    }
    Ok(out)
}
