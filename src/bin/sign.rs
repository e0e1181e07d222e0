//! Compute the checkout signature for an order and payment.
//!
//! Prints the hex HMAC-SHA256 of `order_id|payment_id` that the processor
//! would hand the browser, for exercising `/verify` by hand.

use clap::Parser;
use paydrop::compute_signature;

/// Sign an order/payment pair with the processor key secret.
#[derive(Parser, Debug)]
#[command(name = "paydrop-sign")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Processor order id.
    order_id: String,

    /// Processor payment id.
    payment_id: String,

    /// Processor key secret.
    #[arg(long, env = "PAYDROP_KEY_SECRET", hide_env_values = true)]
    secret: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let signature = compute_signature(args.secret.as_bytes(), &args.order_id, &args.payment_id)?;
    println!("{signature}");
    Ok(())
}
