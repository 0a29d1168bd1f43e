//! Offline tool: assign randomly-drawn equipment to a range of new tokens.
//!
//! Reads a template file of equipment items grouped by `slot`, each with a
//! `dropRate` weight, and appends `count` newly assigned tokens to the
//! collection's base-tier file. Existing entries are merged back in
//! untouched and numbering continues from `max(existing id) + 1`.

use crate::{cli::GenerateArgs, config::ServiceConfig, log};
use anyhow::{Context, Result, bail};
use rand::Rng;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fs, path::Path};

/// One equipment template. `slot` and `dropRate` drive the draw; all other
/// fields are copied into the emitted record verbatim.
#[derive(Debug, Clone, Deserialize)]
struct Equipment {
    slot: String,

    #[serde(rename = "dropRate")]
    drop_rate: f64,

    #[serde(flatten)]
    fields: Map<String, Value>,
}

type Templates = BTreeMap<String, Equipment>;

pub fn run(args: &GenerateArgs, config: &ServiceConfig) -> Result<()> {
    let templates_path = args
        .templates
        .clone()
        .unwrap_or_else(|| config.root_join("config/equipment-templates.json"));
    let templates = load_templates(&templates_path)?;

    let out_path = config
        .metadata
        .base_dir
        .join(&args.project)
        .join(format!("{}.json", args.collection));
    let mut tokens = read_existing(&out_path)?;
    let start = next_token_id(&tokens);

    if args.count == 0 {
        log!("generate"; "nothing to do");
        return Ok(());
    }

    let mut rng = rand::thread_rng();
    for (token_id, record) in generate_tokens(&templates, args.count, start, &mut rng)? {
        tokens.insert(token_id, record);
    }

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&out_path, serde_json::to_string_pretty(&tokens)?)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    log!(
        "generate";
        "{} new token(s) ({}..={}) -> {}",
        args.count,
        start,
        start + args.count as u64 - 1,
        out_path.display()
    );
    Ok(())
}

fn load_templates(path: &Path) -> Result<Templates> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read templates {}", path.display()))?;
    let templates: Templates = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse templates {}", path.display()))?;
    Ok(templates)
}

/// Read the existing collection file, or an empty map for a new collection.
fn read_existing(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let tokens: Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(tokens)
}

/// Next token id: `max(existing numeric id) + 1`, or 0 for a new file.
fn next_token_id(tokens: &Map<String, Value>) -> u64 {
    tokens
        .keys()
        .filter_map(|id| id.parse::<u64>().ok())
        .max()
        .map_or(0, |max| max + 1)
}

/// Draw `count` tokens starting at `start`: a uniformly random slot, then a
/// dropRate-weighted item within it.
fn generate_tokens<R: Rng>(
    templates: &Templates,
    count: usize,
    start: u64,
    rng: &mut R,
) -> Result<Vec<(String, Value)>> {
    let mut by_slot: BTreeMap<&str, Vec<(&String, &Equipment)>> = BTreeMap::new();
    for (name, item) in templates {
        by_slot.entry(item.slot.as_str()).or_default().push((name, item));
    }
    let slots: Vec<&str> = by_slot.keys().copied().collect();
    if slots.is_empty() {
        bail!("no equipment templates to draw from");
    }

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let token_id = start + i as u64;
        let slot = slots[rng.gen_range(0..slots.len())];
        let (name, item) = weighted_pick(&by_slot[slot], rng);
        out.push((token_id.to_string(), emit_record(name, item)));
    }
    Ok(out)
}

/// Weighted draw over `dropRate`. A degenerate all-zero slot falls back to
/// its first item.
fn weighted_pick<'a, R: Rng>(
    items: &[(&'a String, &'a Equipment)],
    rng: &mut R,
) -> (&'a String, &'a Equipment) {
    let total: f64 = items.iter().map(|(_, item)| item.drop_rate).sum();
    if total <= 0.0 {
        return items[0];
    }

    let mut draw = rng.gen_range(0.0..total);
    for entry in items {
        draw -= entry.1.drop_rate;
        if draw <= 0.0 {
            return *entry;
        }
    }
    items[0]
}

/// The emitted token record: template name first, then every template
/// field except `dropRate`.
fn emit_record(name: &str, item: &Equipment) -> Value {
    let mut record = Map::new();
    record.insert("name".to_string(), Value::from(name));
    record.insert("slot".to_string(), Value::from(item.slot.clone()));
    for (key, value) in &item.fields {
        record.insert(key.clone(), value.clone());
    }
    Value::Object(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use serde_json::json;

    fn templates(content: &str) -> Templates {
        serde_json::from_str(content).unwrap()
    }

    const TEMPLATES: &str = r#"{
        "Iron Sword": {"slot": "hand", "damage": 10, "weight": 5, "rarity": "common", "dropRate": 0.6, "description": "A sturdy blade."},
        "Wooden Shield": {"slot": "offhand", "defense": 4, "weight": 3, "rarity": "common", "dropRate": 1.0, "description": "Better than nothing."}
    }"#;

    #[test]
    fn test_next_token_id() {
        assert_eq!(next_token_id(&Map::new()), 0);

        let tokens: Map<String, Value> =
            serde_json::from_str(r#"{"0": {}, "1": {}, "7": {}}"#).unwrap();
        assert_eq!(next_token_id(&tokens), 8);
    }

    #[test]
    fn test_emit_record_drops_drop_rate_and_leads_with_name() {
        let templates = templates(TEMPLATES);
        let record = emit_record("Iron Sword", &templates["Iron Sword"]);

        let object = record.as_object().unwrap();
        assert!(object.get("dropRate").is_none());
        assert_eq!(object["name"], json!("Iron Sword"));
        assert_eq!(object["slot"], json!("hand"));
        assert_eq!(object["damage"], json!(10));
        assert_eq!(object.keys().next().unwrap(), "name");
    }

    #[test]
    fn test_generate_tokens_numbering_and_shape() {
        let templates = templates(TEMPLATES);
        let mut rng = StdRng::seed_from_u64(7);

        let generated = generate_tokens(&templates, 4, 3, &mut rng).unwrap();
        let ids: Vec<&str> = generated.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["3", "4", "5", "6"]);

        for (_, record) in &generated {
            let name = record["name"].as_str().unwrap();
            assert!(templates.contains_key(name));
            assert!(record.get("dropRate").is_none());
        }
    }

    #[test]
    fn test_weighted_pick_never_selects_zero_weight() {
        let templates = templates(
            r#"{
                "Common Dagger": {"slot": "hand", "weight": 1, "rarity": "common", "dropRate": 5.0, "description": "d"},
                "Unobtainable": {"slot": "hand", "weight": 1, "rarity": "mythic", "dropRate": 0.0, "description": "u"}
            }"#,
        );
        let items: Vec<(&String, &Equipment)> = templates.iter().collect();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let (name, _) = weighted_pick(&items, &mut rng);
            assert_eq!(name, "Common Dagger");
        }
    }

    #[test]
    fn test_weighted_pick_degenerate_all_zero() {
        let templates = templates(
            r#"{
                "A": {"slot": "hand", "weight": 1, "rarity": "common", "dropRate": 0.0, "description": "a"},
                "B": {"slot": "hand", "weight": 1, "rarity": "common", "dropRate": 0.0, "description": "b"}
            }"#,
        );
        let items: Vec<(&String, &Equipment)> = templates.iter().collect();
        let mut rng = StdRng::seed_from_u64(1);
        let (name, _) = weighted_pick(&items, &mut rng);
        assert_eq!(name, "A");
    }

    #[test]
    fn test_no_templates_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_tokens(&Templates::new(), 1, 0, &mut rng).is_err());
    }

    #[test]
    fn test_merge_preserves_existing_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Equipment.json");

        let existing = json!({
            "0": {"name": "Old Sword", "slot": "hand"},
            "1": {"name": "Old Shield", "slot": "offhand"},
            "2": {"name": "Old Helm", "slot": "head"}
        });
        fs::write(&path, serde_json::to_string_pretty(&existing).unwrap()).unwrap();

        let mut tokens = read_existing(&path).unwrap();
        let start = next_token_id(&tokens);
        assert_eq!(start, 3);

        let templates = templates(TEMPLATES);
        let mut rng = StdRng::seed_from_u64(7);
        for (id, record) in generate_tokens(&templates, 2, start, &mut rng).unwrap() {
            tokens.insert(id, record);
        }
        fs::write(&path, serde_json::to_string_pretty(&tokens).unwrap()).unwrap();

        let merged = read_existing(&path).unwrap();
        let ids: Vec<&str> = merged.keys().map(String::as_str).collect();
        // Exactly {0,1,2,3,4}, prior entries first and in their old order
        assert_eq!(ids, ["0", "1", "2", "3", "4"]);

        for id in ["0", "1", "2"] {
            assert_eq!(
                serde_json::to_string_pretty(&merged[id]).unwrap(),
                serde_json::to_string_pretty(&existing[id]).unwrap(),
            );
        }
    }
}
