use anyhow::Result;

use crate::{cache::open_cache, classify::Classifier, cli::ClassifyArgs};

pub fn format_lookup(code: &str, classifier: &Classifier) -> String {
    let info = classifier.classify(code);
    format!(
        "Code: {code} => {} | {} | {}",
        info.category, info.subcategory, info.description
    )
}

pub fn run(args: ClassifyArgs) -> Result<()> {
    let classifier = Classifier::with_cache(open_cache(args.cache_db.as_deref())?);
    for code in &args.codes {
        println!("{}", format_lookup(code, &classifier));
    }
    tracing::debug!(
        "{} lookups, {} table scans",
        args.codes.len(),
        classifier.table_scans()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_lookup_lines() {
        let classifier = Classifier::new();
        assert_eq!(
            format_lookup("00120", &classifier),
            "Code: 00120 => Anesthesia | General | Anesthesia for surgical procedures"
        );
        assert_eq!(
            format_lookup("Z9999", &classifier),
            "Code: Z9999 => Unknown | Unknown | Not found in lookup"
        );
    }
}
