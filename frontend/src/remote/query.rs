use std::fmt::Display;

use url::Url;

use crate::config::Config;

/// A row-service request target: table plus filter/order parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: &'static str,
    params: Vec<(String, String)>,
}

impl Query {
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            params: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.params.push(("order".to_string(), format!("{}.asc", column)));
        self
    }

    pub fn url(&self, config: &Config) -> Url {
        let mut url = config.rest_url(self.table);
        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }
        url
    }
}
