use anyhow::{Context, Result};
use serde_json::Value;

use mpds_client::fields::DEFAULT_COLUMNS;
use mpds_client::{Config, EntryKind, FieldExpr, Fields};

use super::api_client;

/// Arguments of `mpds fetch`.
#[derive(Debug)]
pub struct FetchRequest<'a> {
    pub search: &'a str,
    pub phases: &'a [u64],
    pub fields: &'a [String],
    pub default_fields: bool,
    pub columns: &'a [String],
}

/// Parse a search given on the command line; it must be a JSON object.
pub fn parse_search(search: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(search).context("Search must be valid JSON")?;
    if !value.is_object() {
        anyhow::bail!("Search must be a JSON object, e.g. '{{\"elements\": \"Cu-Zn\"}}'");
    }
    Ok(value)
}

/// Build a field selection from `KIND:EXPR` arguments, keeping their order
/// within each kind.
pub fn parse_fields(specs: &[String]) -> Result<Fields> {
    let mut by_kind: Vec<(EntryKind, Vec<FieldExpr>)> = Vec::new();
    for spec in specs {
        let (kind, expr) = spec
            .split_once(':')
            .with_context(|| format!("Field {spec:?} must look like KIND:EXPR"))?;
        let kind: EntryKind = kind.trim().parse()?;
        let expr: FieldExpr = expr.parse()?;
        match by_kind.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, exprs)) => exprs.push(expr),
            None => by_kind.push((kind, vec![expr])),
        }
    }
    Ok(by_kind
        .into_iter()
        .fold(Fields::new(), |fields, (kind, exprs)| fields.with(kind, exprs)))
}

pub async fn run_count(config: &Config, search: &str, phases: &[u64]) -> Result<()> {
    let search = parse_search(search)?;
    let client = api_client(config)?;
    let count = client.count_data(&search, phases).await?;
    println!("{count}");
    Ok(())
}

pub async fn run_fetch(config: &Config, request: &FetchRequest<'_>) -> Result<()> {
    let search = parse_search(request.search)?;
    let client = api_client(config)?;

    let mut columns: Vec<&str> = request.columns.iter().map(String::as_str).collect();
    let fields = if request.default_fields {
        if columns.is_empty() {
            columns = DEFAULT_COLUMNS.to_vec();
        }
        Fields::default_set()?
    } else {
        parse_fields(request.fields)?
    };

    if fields.is_empty() {
        let entries = client.get_raw(&search, request.phases).await?;
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if columns.is_empty() {
        for row in client.get_data(&search, request.phases, &fields).await? {
            println!("{}", serde_json::to_string(&row)?);
        }
    } else {
        let table = client
            .get_table(&search, request.phases, &fields, &columns)
            .await?;
        print!("{}", table.to_csv());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_search() {
        assert_eq!(
            parse_search(r#"{"elements": "Cu-Zn"}"#).unwrap(),
            json!({"elements": "Cu-Zn"})
        );
        assert!(parse_search("[1, 2]").is_err());
        assert!(parse_search("elements=Cu").is_err());
    }

    #[test]
    fn test_parse_fields_groups_by_kind() {
        let specs: Vec<String> = [
            "P:sample.material.phase_id",
            "S:phase_id",
            "P:=eV",
            "P:sample.measurement[0].property.scalar",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        let fields = parse_fields(&specs).unwrap();

        let p = fields.get(EntryKind::P).unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p[1], FieldExpr::Const(json!("eV")));
        assert_eq!(fields.get(EntryKind::S).unwrap().len(), 1);
        assert!(fields.get(EntryKind::C).is_none());
    }

    #[test]
    fn test_parse_fields_errors() {
        assert!(parse_fields(&["phase_id".to_string()]).is_err());
        assert!(parse_fields(&["X:phase_id".to_string()]).is_err());
        assert!(parse_fields(&["P:a[".to_string()]).is_err());
    }

    #[test]
    fn test_no_fields_is_empty() {
        assert!(parse_fields(&[]).unwrap().is_empty());
    }
}
