use crate::core::{CurrencyCatalog, RateProvider};
use anyhow::Result;

/// Lists every supported currency code with its name, sorted by code.
pub async fn build_listing(provider: &dyn RateProvider) -> Result<String> {
    let catalog = provider.fetch_currencies().await?;
    Ok(format_catalog(&catalog))
}

pub fn format_catalog(catalog: &CurrencyCatalog) -> String {
    if catalog.is_empty() {
        return "No supported currencies found".to_string();
    }

    let mut out = String::from("🏦 Supported currency codes\n\n");
    let lines: Vec<String> = catalog
        .iter()
        .map(|(code, name)| format!("• {code}: {name}"))
        .collect();
    out.push_str(&lines.join("\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_catalog_sorted() {
        let catalog: CurrencyCatalog = [
            ("USD".to_string(), "United States Dollar".to_string()),
            ("AUD".to_string(), "Australian Dollar".to_string()),
        ]
        .into_iter()
        .collect();

        let text = format_catalog(&catalog);

        assert_eq!(
            text,
            "🏦 Supported currency codes\n\n• AUD: Australian Dollar\n• USD: United States Dollar"
        );
    }

    #[test]
    fn test_format_empty_catalog() {
        assert_eq!(
            format_catalog(&CurrencyCatalog::default()),
            "No supported currencies found"
        );
    }
}
