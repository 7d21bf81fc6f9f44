use anyhow::Result;
use clap::Subcommand;
use shared::config::Config;
use shared::models::{StockPage, page_window};

use super::{connect, report};

const PAGER_WIDTH: u32 = 5;

#[derive(Subcommand, Debug)]
pub enum StockCommand {
    /// Search products by name
    Search {
        /// Search term; lists every product when omitted
        term: Option<String>,

        #[arg(long, short, default_value_t = 1)]
        page: u32,
    },
}

pub async fn run(config: &Config, command: StockCommand) -> Result<()> {
    match command {
        StockCommand::Search { term, page } => {
            let client = connect(config)?;
            let result = client
                .search_stock(page.max(1), term.as_deref())
                .await
                .map_err(|err| report(&client, err))?;
            print_page(&result);
            Ok(())
        }
    }
}

fn print_page(page: &StockPage) {
    if page.data.is_empty() {
        println!("No products found.");
        return;
    }

    println!("{:<38} {:<40} {:>8} {:>12}", "PRODUCT", "NAME", "UNIT", "PRICE");
    for item in &page.data {
        let price = item
            .purchase_price
            .map_or_else(|| "-".to_string(), |price| format!("{price:.2}"));
        println!(
            "{:<38} {:<40} {:>8} {:>12}",
            item.product_id(),
            item.display_name(),
            item.unit().unwrap_or("-"),
            price
        );
    }

    let pagination = &page.pagination;
    println!(
        "page {} of {} ({} products) pages: {:?}",
        pagination.current_page,
        pagination.total_pages,
        pagination.total_count,
        page_window(pagination.current_page, pagination.total_pages, PAGER_WIDTH)
    );
}
