//! SPARQL query construction for the Land Registry price-paid dataset.
//!
//! The endpoint exposes transactions through the `lrppi` vocabulary. The one
//! query this tool needs selects postcode, price paid, transaction date, and
//! the optional property-type label for every sale in a town within an
//! inclusive date range.

use chrono::NaiveDate;

const QUERY_PREFIXES: &str = "\
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
PREFIX lrppi: <http://landregistry.data.gov.uk/def/ppi/>
PREFIX lrcommon: <http://landregistry.data.gov.uk/def/common/>
";

/// Build the price-paid SELECT query for a town and inclusive date range.
///
/// The town name is upper-cased (the dataset stores towns in upper case and
/// filters by exact match) and the dates are rendered as ISO-8601 `xsd:date`
/// bounds.
pub fn price_paid_query(town: &str, start: NaiveDate, end: NaiveDate) -> String {
    let town = town.trim().to_uppercase();
    format!(
        "{QUERY_PREFIXES}
SELECT ?postcode ?amount ?date ?propertyTypeLabel
WHERE
{{
    ?addr lrcommon:town ?town ;
          lrcommon:postcode ?postcode.

    FILTER(?town = \"{town}\"^^xsd:string)

    ?transx lrppi:propertyAddress ?addr ;
            lrppi:pricePaid ?amount ;
            lrppi:transactionDate ?date ;
            lrppi:propertyType ?propertyType.

    OPTIONAL {{ ?propertyType rdfs:label ?propertyTypeLabel }}

    FILTER(?date >= \"{start}\"^^xsd:date && ?date <= \"{end}\"^^xsd:date)
}}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_town_is_uppercased() {
        let q = price_paid_query("Wolverhampton", date(2000, 1, 1), date(2023, 12, 31));
        assert!(q.contains("\"WOLVERHAMPTON\"^^xsd:string"));
        assert!(!q.contains("Wolverhampton"));
    }

    #[test]
    fn test_town_is_trimmed() {
        let q = price_paid_query("  walsall ", date(2000, 1, 1), date(2023, 12, 31));
        assert!(q.contains("\"WALSALL\"^^xsd:string"));
    }

    #[test]
    fn test_dates_are_iso_8601_inclusive_bounds() {
        let q = price_paid_query("LEEDS", date(2001, 2, 3), date(2022, 11, 30));
        assert!(q.contains("?date >= \"2001-02-03\"^^xsd:date"));
        assert!(q.contains("?date <= \"2022-11-30\"^^xsd:date"));
    }

    #[test]
    fn test_selects_expected_columns() {
        let q = price_paid_query("YORK", date(2000, 1, 1), date(2020, 1, 1));
        assert!(q.contains("SELECT ?postcode ?amount ?date ?propertyTypeLabel"));
        assert!(q.contains("OPTIONAL { ?propertyType rdfs:label ?propertyTypeLabel }"));
    }
}
