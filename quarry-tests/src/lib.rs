mod aggregates;
mod cache;
mod compound;
mod joins;
mod live;
mod nullability;
mod org_chart;
mod pagination;
mod simple;
mod transactions;
mod writes;

use crate::{
    aggregates::aggregates,
    cache::cache,
    compound::compound,
    joins::joins,
    live::live,
    nullability::nullability,
    org_chart::org_chart,
    pagination::pagination,
    simple::simple,
    transactions::transactions,
    writes::writes,
};
use log::LevelFilter;
use quarry::{Connection, Database};
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

pub async fn execute_tests<C: Connection>(database: Database<C>) {
    simple(&database).await;
    nullability(&database).await;
    writes(&database).await;
    pagination(&database).await;
    joins(&database).await;
    aggregates(&database).await;
    compound(&database).await;
    org_chart(&database).await;
    cache(&database).await;
    transactions(&database).await;
    live(&database).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
