use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use client::ApiError;
use shared::cart::{Cart, DeliveryDetails, ManualProduct};
use shared::config::Config;
use shared::models::{Order, OrdersResponse, page_window};

use super::{connect, report};

const PAGER_WIDTH: u32 = 5;

#[derive(Subcommand, Debug)]
pub enum OrdersCommand {
    /// List the orders of a location
    List {
        /// Location id; defaults to the logged-in user's location
        #[arg(long, short)]
        location: Option<String>,

        #[arg(long, short, default_value_t = 1)]
        page: u32,
    },

    /// Show one order with its lines
    Show { id: String },

    /// Delete an order
    Delete { id: String },

    /// Place a new order for the logged-in user's location
    Create(CreateArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Catalogue product as ID:QTY or ID:QTY:NAME (repeatable)
    #[arg(long = "product", value_parser = parse_product_line)]
    pub products: Vec<ProductLine>,

    /// Product not in the catalogue as NAME:QTY or NAME:QTY:UNIT (repeatable)
    #[arg(long = "manual", value_parser = parse_manual_line)]
    pub manual: Vec<ManualLine>,

    /// Delivery date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    #[command(flatten)]
    pub delivery: DeliveryMode,

    /// Free-form note for the order
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct DeliveryMode {
    /// The supplier delivers the order
    #[arg(long)]
    pub delivery: bool,

    /// The order is picked up
    #[arg(long)]
    pub no_delivery: bool,
}

/// `--product` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLine {
    pub id: String,
    pub quantity: u32,
    pub name: Option<String>,
}

/// `--manual` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualLine {
    pub name: String,
    pub quantity: u32,
    pub unit: Option<String>,
}

fn parse_quantity(value: &str) -> Result<u32, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("`{value}` is not a valid quantity"))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn parse_product_line(value: &str) -> Result<ProductLine, String> {
    let mut parts = value.splitn(3, ':');
    let id = non_blank(parts.next()).ok_or("expected ID:QTY[:NAME]")?;
    let quantity = parse_quantity(parts.next().ok_or("expected ID:QTY[:NAME]")?)?;
    Ok(ProductLine {
        id,
        quantity,
        name: non_blank(parts.next()),
    })
}

pub fn parse_manual_line(value: &str) -> Result<ManualLine, String> {
    let mut parts = value.splitn(3, ':');
    let name = non_blank(parts.next()).ok_or("expected NAME:QTY[:UNIT]")?;
    let quantity = parse_quantity(parts.next().ok_or("expected NAME:QTY[:UNIT]")?)?;
    Ok(ManualLine {
        name,
        quantity,
        unit: non_blank(parts.next()),
    })
}

/// Fill a cart from the command line.
fn build_cart(args: &CreateArgs) -> Result<Cart> {
    let mut cart = Cart::new();

    for line in &args.products {
        let name = line.name.as_deref().unwrap_or(&line.id);
        let key = cart.add_catalog(&line.id, name, None, None);
        cart.set_quantity(&key, Some(line.quantity))
            .with_context(|| format!("product {}", line.id))?;
    }

    for line in &args.manual {
        cart.add_manual(ManualProduct {
            name: line.name.clone(),
            quantity: Some(line.quantity),
            unit: line.unit.clone(),
            price: None,
            notes: None,
        })
        .with_context(|| format!("manual product {}", line.name))?;
    }

    Ok(cart)
}

pub async fn run(config: &Config, command: OrdersCommand) -> Result<()> {
    let client = connect(config)?;

    match command {
        OrdersCommand::List { location, page } => {
            let response = client
                .orders(location.as_deref(), page.max(1))
                .await
                .map_err(|err| report(&client, err))?;
            print_orders(&response);
        }
        OrdersCommand::Show { id } => {
            let order = client.order(&id).await.map_err(|err| report(&client, err))?;
            print_order(&order);
        }
        OrdersCommand::Delete { id } => {
            client.delete_order(&id).await.map_err(|err| report(&client, err))?;
            println!("Deleted order {id}");
        }
        OrdersCommand::Create(args) => {
            let location_id = client
                .session()
                .location_id()
                .ok_or_else(|| report(&client, ApiError::NoLocation))?;
            let cart = build_cart(&args)?;
            let delivery = DeliveryDetails {
                date: args.date,
                is_logist: args.delivery.delivery,
                note: args.note.clone(),
            };
            let request = cart.checkout(&location_id, &delivery)?;
            let lines = request.items.len();

            client.create_order(request).await.map_err(|err| report(&client, err))?;
            println!("Order placed with {lines} line(s) for {}", args.date);
        }
    }

    Ok(())
}

fn print_orders(response: &OrdersResponse) {
    let page = &response.data;
    if page.records.is_empty() {
        println!("No orders found.");
        return;
    }

    println!(
        "{:<10} {:<12} {:<12} {:<10} {:>6}",
        "ID", "STATUS", "CONTRACT", "DATE", "LINES"
    );
    for order in &page.records {
        println!(
            "{:<10} {:<12} {:<12} {:<10} {:>6}",
            order.short_id(),
            order.status.as_str(),
            order.contract_number.as_deref().unwrap_or("-"),
            order
                .date
                .map_or_else(|| "-".to_string(), |date| date.format("%Y-%m-%d").to_string()),
            order.item_count()
        );
    }

    let pagination = &page.pagination;
    println!(
        "page {} of {} ({} orders) pages: {:?}",
        pagination.page,
        pagination.total_pages,
        pagination.total_count,
        page_window(pagination.page, pagination.total_pages, PAGER_WIDTH)
    );
}

fn print_order(order: &Order) {
    println!("order: {}", order.id);
    println!("status: {}", order.status);
    if let Some(contract) = &order.contract_number {
        println!("contract: {contract}");
    }
    if let Some(date) = order.date {
        println!("delivery date: {}", date.format("%Y-%m-%d"));
    }
    if let Some(is_logist) = order.is_logist {
        println!("delivery: {}", if is_logist { "yes" } else { "no" });
    }
    if let Some(note) = &order.note {
        println!("note: {note}");
    }
    for item in &order.offer_items {
        println!("  {:<40} {:>10}", item.product_name, item.quantity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::cart::CartError;

    fn args(products: &[&str], manual: &[&str]) -> CreateArgs {
        CreateArgs {
            products: products
                .iter()
                .map(|value| parse_product_line(value).unwrap())
                .collect(),
            manual: manual
                .iter()
                .map(|value| parse_manual_line(value).unwrap())
                .collect(),
            date: NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
            delivery: DeliveryMode {
                delivery: true,
                no_delivery: false,
            },
            note: None,
        }
    }

    #[test]
    fn test_parse_product_line() {
        assert_eq!(
            parse_product_line("p-1:12").unwrap(),
            ProductLine {
                id: "p-1".to_string(),
                quantity: 12,
                name: None,
            }
        );
        let named = parse_product_line("p-2:3:Cement M400").unwrap();
        assert_eq!(named.name.as_deref(), Some("Cement M400"));
    }

    #[test]
    fn test_parse_product_line_rejects_bad_input() {
        assert!(parse_product_line("p-1").is_err());
        assert!(parse_product_line(":4").is_err());
        assert!(parse_product_line("p-1:many").is_err());
        assert!(parse_product_line("p-1:-2").is_err());
    }

    #[test]
    fn test_parse_manual_line_keeps_colons_in_unit() {
        let line = parse_manual_line("Rebar 12mm:40:m:long").unwrap();
        assert_eq!(line.name, "Rebar 12mm");
        assert_eq!(line.quantity, 40);
        assert_eq!(line.unit.as_deref(), Some("m:long"));
        assert_eq!(parse_manual_line("Sand:2:").unwrap().unit, None);
    }

    #[test]
    fn test_build_cart_checks_out_every_line() {
        let cart = build_cart(&args(&["p-1:5", "p-2:1:Glue"], &["Sand:2:t"])).unwrap();
        let delivery = DeliveryDetails {
            date: NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
            is_logist: true,
            note: Some("  ".to_string()),
        };

        let request = cart.checkout("L1", &delivery).unwrap();

        assert_eq!(request.items.len(), 3);
        assert_eq!(request.items[0].product_name, "p-1");
        assert_eq!(request.items[1].product_name, "Glue");
        assert_eq!(request.items[2].product_id, None);
        assert_eq!(request.date.as_deref(), Some("2026-10-21T12:00:00Z"));
        assert_eq!(request.note, None);
    }

    #[test]
    fn test_build_cart_rejects_oversized_quantity() {
        assert!(build_cart(&args(&["p-1:1000000"], &[])).is_err());
    }

    #[test]
    fn test_empty_cart_cannot_be_checked_out() {
        let cart = build_cart(&args(&[], &[])).unwrap();
        let delivery = DeliveryDetails {
            date: NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
            is_logist: false,
            note: None,
        };
        assert_eq!(cart.checkout("L1", &delivery), Err(CartError::Empty));
    }
}
