use chrono::Datelike;

use super::ProjectInput;

/// Research queries for a project, most specific first, capped at `max`.
pub fn build_queries(input: &ProjectInput, max: usize) -> Vec<String> {
    build_queries_for_year(input, max, chrono::Utc::now().year())
}

pub fn build_queries_for_year(input: &ProjectInput, max: usize, year: i32) -> Vec<String> {
    let segment = input.segment.trim();
    let mut queries = match input.product() {
        Some(product) => vec![
            format!("{segment} {product} market data statistics {year}"),
            format!("{segment} {product} competitive analysis opportunities"),
            format!("{segment} {product} trends future growth"),
        ],
        None => vec![
            format!("{segment} market data statistics growth {year}"),
            format!("{segment} competitive analysis leading companies"),
            format!("{segment} trends investment opportunities"),
        ],
    };

    if let Some(audience) = input.audience() {
        queries.push(format!("{audience} consumer behavior {segment} research"));
        queries.push(format!("{audience} demographic profile data"));
    }

    queries.push(format!("{segment} startups venture capital investment"));
    queries.push(format!("{segment} company success stories"));
    queries.push(format!("{segment} main challenges market solutions"));

    queries.truncate(max);
    queries
}
