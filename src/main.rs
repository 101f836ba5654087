//! Storefront checkout CLI

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_checkout::session::TokenStore;
use storefront_checkout::{
    CartLineItem, CheckoutOutcome, CheckoutPage, Config, GateDecision, HttpApi, Money, MoneyError, Order, OrderId, PaymentMethod,
    ProductId, ShippingDetails, SimulatedCapture, Storefront, Totals,
};

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Cart and checkout against a storefront backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the cart with totals
    Cart,
    /// Add a product or set its quantity
    Add { product: String, quantity: u32 },
    /// Remove a product from the cart
    Remove { product: String },
    /// Empty the cart
    Clear,
    /// Run checkout: shipping, payment, place order
    Checkout(CheckoutArgs),
    /// List your orders (or every order, for admins)
    Orders {
        #[arg(long)]
        all: bool,
    },
    /// Show one order
    Order { id: String },
    /// Store an access token for later commands
    Login { token: String },
    /// Forget the stored access token
    Logout,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    #[arg(long)]
    address: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    postal_code: String,
    #[arg(long)]
    country: String,
    /// CashOnDelivery, CreditCard, PayPal, ...
    #[arg(long, default_value = "CashOnDelivery")]
    payment: String,
    /// Buy this product directly instead of the cart contents
    #[arg(long)]
    buy_now: Option<String>,
    #[arg(long, default_value_t = 1)]
    quantity: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let tokens = TokenStore::new(&config.token_file);

    match &cli.command {
        Command::Login { token } => {
            tokens.save(token)?;
            println!("Token saved to {}", tokens.path().display());
            return Ok(());
        }
        Command::Logout => {
            tokens.clear()?;
            println!("Signed out");
            return Ok(());
        }
        _ => {}
    }

    let api = HttpApi::new(&config.api_url, config.http_timeout)?.with_token(tokens.load()?);
    tracing::info!(api = %api.base_url(), "storefront client ready");
    let store = Storefront::with_pricing(api, Default::default(), config.discount);
    let money = |amount: Decimal| Money::new(amount, &config.currency).rounded();

    match cli.command {
        Command::Cart => {
            store.load_cart().await?;
            print_cart(&store, &money).await;
        }
        Command::Add { product, quantity } => {
            let product = store.product(&ProductId::new(product)).await?;
            store.add_or_update_item(&product, quantity).await?;
            print_cart(&store, &money).await;
        }
        Command::Remove { product } => {
            store.remove_item(&ProductId::new(product)).await?;
            print_cart(&store, &money).await;
        }
        Command::Clear => {
            store.clear_cart().await?;
            println!("Cart cleared");
        }
        Command::Checkout(args) => checkout(&store, args, &money).await?,
        Command::Orders { all } => {
            let orders = if all { store.all_orders().await? } else { store.my_orders().await? };
            if orders.is_empty() { println!("No orders"); }
            for order in &orders { print_order_line(order, &money); }
        }
        Command::Order { id } => {
            let order = store.order(&OrderId::new(id)).await?;
            print_order_line(&order, &money);
            for item in &order.order_items {
                println!("  {} x{} @ {} = {}", item.name, item.quantity, money(item.unit_price), money(item.unit_price).multiply(item.quantity));
            }
            println!("  Items: {}", items_total(&order.order_items, &config.currency)?);
        }
        Command::Login { .. } | Command::Logout => {}
    }
    Ok(())
}

async fn checkout(store: &Storefront<HttpApi>, args: CheckoutArgs, money: &impl Fn(Decimal) -> Money) -> Result<()> {
    store.load_cart().await?;
    if let Some(product) = args.buy_now {
        let product = store.product(&ProductId::new(product)).await?;
        store.set_buy_now(product, args.quantity).await?;
    }

    store.save_shipping(ShippingDetails::new(args.address, args.city, args.postal_code, args.country)).await?;
    if let GateDecision::Redirect(to) = store.enter(&CheckoutPage::Payment).await {
        bail!("Cannot continue to payment, go to {to}");
    }
    store.save_payment_method(PaymentMethod::from(args.payment)).await?;
    if let GateDecision::Redirect(to) = store.enter(&CheckoutPage::PlaceOrder).await {
        bail!("Cannot place order yet, go to {to}");
    }

    let totals = store.totals().await;
    println!("Items:    {}", money(totals.subtotal));
    println!("Discount: {}", money(totals.discount));
    println!("Shipping: {}", money(totals.shipping_fee));
    println!("Total:    {}", grand_total(&totals, money)?);

    match store.complete_checkout(&SimulatedCapture).await? {
        CheckoutOutcome::Placed(id) => println!("Order placed: {}", CheckoutPage::Confirmation(id)),
        CheckoutOutcome::Redirect(session) => println!("Complete payment at {}", session.url),
    }
    Ok(())
}

async fn print_cart(store: &Storefront<HttpApi>, money: &impl Fn(Decimal) -> Money) {
    let state = store.snapshot().await;
    if state.cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for item in state.cart.items() {
        println!("{:<12} {:<30} x{:<3} {}", item.product_id, item.name, item.quantity, money(item.unit_price).multiply(item.quantity));
    }
    let totals = store.totals().await;
    println!("Subtotal: {}  Discount: {}  Shipping: {}  Total: {}", money(totals.subtotal), money(totals.discount), money(totals.shipping_fee), money(totals.total));
}

fn print_order_line(order: &Order, money: &impl Fn(Decimal) -> Money) {
    let placed = order.created_at.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_default();
    println!("{:<26} {:<10} {:<10} {}", order.id, placed, order.status_label(), money(order.total_price));
}

fn grand_total(totals: &Totals, money: &impl Fn(Decimal) -> Money) -> Result<Money, MoneyError> {
    money(totals.subtotal).subtract(&money(totals.discount))?.add(&money(totals.shipping_fee))
}

fn items_total(items: &[CartLineItem], currency: &str) -> Result<Money, MoneyError> {
    items.iter().try_fold(Money::zero(currency), |sum, item| sum.add(&Money::new(item.unit_price, currency).multiply(item.quantity)))
}
