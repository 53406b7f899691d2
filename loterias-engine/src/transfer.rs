//! Exportación e importación del histórico como archivo JSON.
//!
//! La importación valida lote por lote: los lotes inválidos se descartan y se
//! informan, pero el archivo entero solo se rechaza si no tiene la forma
//! esperada o si ningún lote es utilizable.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use loterias_db::models::{validate_play, Batch, Combination, GameConfig};

use crate::error::{LotoError, LotoResult};

pub const EXPORT_FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub batch_count: usize,
    pub history: Vec<Batch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBatch {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ParsedImport {
    pub batches: Vec<Batch>,
    pub skipped: Vec<SkippedBatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<SkippedBatch>,
    /// Lotes antiguos descartados por el límite del histórico.
    pub evicted: usize,
}

pub fn export_history(history: &[Batch], now: DateTime<Utc>) -> LotoResult<ExportFile> {
    if history.is_empty() {
        return Err(LotoError::EmptyBatch);
    }
    Ok(ExportFile {
        version: EXPORT_FORMAT_VERSION.to_string(),
        exported_at: now,
        batch_count: history.len(),
        history: history.to_vec(),
    })
}

pub fn to_json(file: &ExportFile) -> LotoResult<String> {
    Ok(serde_json::to_string_pretty(file)?)
}

pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("historico_combinaciones_{}.json", now.format("%Y-%m-%d"))
}

pub fn parse_import(json: &str) -> LotoResult<ParsedImport> {
    let root: Value = serde_json::from_str(json)
        .map_err(|e| LotoError::MalformedImport(format!("JSON ilegible: {e}")))?;
    let Value::Object(mut root) = root else {
        return Err(LotoError::MalformedImport(
            "se esperaba un objeto JSON".to_string(),
        ));
    };
    let entries = match root.remove("history") {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(LotoError::MalformedImport(
                "el campo 'history' no es una lista".to_string(),
            ))
        }
        None => {
            return Err(LotoError::MalformedImport(
                "falta el campo 'history'".to_string(),
            ))
        }
    };

    let mut batches = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match validate_batch(entry) {
            Ok(mut batch) => {
                batch.id = Uuid::new_v4().to_string();
                batches.push(batch);
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(index, %reason, "lote descartado en la importación");
                skipped.push(SkippedBatch { index, reason });
            }
        }
    }

    if batches.is_empty() {
        return Err(LotoError::MalformedImport(format!(
            "ningún lote válido ({} descartados)",
            skipped.len()
        )));
    }
    Ok(ParsedImport { batches, skipped })
}

fn validate_batch(entry: Value) -> anyhow::Result<Batch> {
    let batch: Batch = serde_json::from_value(entry).context("estructura de lote inválida")?;
    check_batch(&batch)?;
    Ok(batch)
}

/// Reglas que debe cumplir un lote leído de fuera, sea de un archivo o del almacenamiento.
pub fn check_batch(batch: &Batch) -> anyhow::Result<()> {
    if batch.combinations.is_empty() {
        bail!("lote sin combinaciones");
    }
    let config = GameConfig::for_game(batch.game);
    for (i, combination) in batch.combinations.iter().enumerate() {
        check_combination(combination, config).with_context(|| format!("combinación {}", i + 1))?;
    }
    Ok(())
}

fn check_combination(combination: &Combination, config: &GameConfig) -> anyhow::Result<()> {
    validate_play(&combination.play, config)?;
    if combination.score > 100 {
        bail!("puntuación fuera de rango: {}", combination.score);
    }
    let value = combination.probability_display;
    if !value.is_finite() || value < 0.0 {
        bail!("valor visual inválido: {}", value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use loterias_db::models::{GameKind, Play};

    fn mi_loto_batch(id: &str) -> Batch {
        Batch {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
            game: GameKind::MiLoto,
            combinations: vec![Combination {
                id: "c1".to_string(),
                play: Play::MiLoto {
                    numbers: vec![3, 8, 15, 22, 37],
                },
                score: 71,
                probability_display: 21.4,
                selected: false,
            }],
        }
    }

    #[test]
    fn test_export_empty_history() {
        assert!(matches!(
            export_history(&[], Utc::now()),
            Err(LotoError::EmptyBatch)
        ));
    }

    #[test]
    fn test_export_file_shape() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap();
        let file = export_history(&[mi_loto_batch("b1")], now).unwrap();
        let json: Value = serde_json::from_str(&to_json(&file).unwrap()).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["batchCount"], 1);
        assert!(json["exportedAt"].as_str().unwrap().starts_with("2024-03-10T08:30:00"));
        assert_eq!(json["history"][0]["combinations"][0]["game"], "mi-loto");
        assert_eq!(export_file_name(now), "historico_combinaciones_2024-03-10.json");
    }

    #[test]
    fn test_roundtrip_assigns_fresh_ids() {
        let file = export_history(&[mi_loto_batch("b1"), mi_loto_batch("b2")], Utc::now()).unwrap();
        let parsed = parse_import(&to_json(&file).unwrap()).unwrap();
        assert_eq!(parsed.batches.len(), 2);
        assert!(parsed.skipped.is_empty());
        assert_ne!(parsed.batches[0].id, "b1");
        assert_eq!(parsed.batches[0].combinations, file.history[0].combinations);
        assert_eq!(parsed.batches[0].timestamp, file.history[0].timestamp);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        for raw in ["[]", "{}", r#"{"history": 3}"#, "no es json", r#"{"history": []}"#] {
            let err = parse_import(raw).unwrap_err();
            assert!(matches!(err, LotoError::MalformedImport(_)), "{raw}");
        }
    }

    #[test]
    fn test_partial_import_skips_invalid_batches() {
        let good = serde_json::to_value(mi_loto_batch("ok")).unwrap();
        let mut out_of_range = good.clone();
        out_of_range["combinations"][0]["numbers"] = serde_json::json!([1, 2, 3, 4, 40]);
        let mut empty = good.clone();
        empty["combinations"] = serde_json::json!([]);
        let mut wrong_game = good.clone();
        wrong_game["game"] = serde_json::json!("baloto");
        let mut high_score = good.clone();
        high_score["combinations"][0]["score"] = serde_json::json!(250);
        let mut negative_value = good.clone();
        negative_value["combinations"][0]["probabilityDisplay"] = serde_json::json!(-7.5);

        let raw = serde_json::json!({
            "history": [good, out_of_range, empty, wrong_game, {"foo": 1}, high_score, negative_value]
        })
        .to_string();
        let parsed = parse_import(&raw).unwrap();
        assert_eq!(parsed.batches.len(), 1);
        let skipped: Vec<usize> = parsed.skipped.iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![1, 2, 3, 4, 5, 6]);
        assert!(parsed.skipped[4].reason.contains("puntuación fuera de rango: 250"));
        assert!(parsed.skipped[5].reason.contains("valor visual inválido: -7.5"));
    }

    #[test]
    fn test_check_batch_rejects_non_finite_value() {
        let mut batch = mi_loto_batch("b1");
        assert!(check_batch(&batch).is_ok());
        batch.combinations[0].probability_display = f64::NAN;
        assert!(check_batch(&batch).is_err());
        batch.combinations[0].probability_display = 0.0;
        batch.combinations[0].score = 100;
        assert!(check_batch(&batch).is_ok());
    }

    #[test]
    fn test_all_invalid_is_rejected() {
        let raw = r#"{"history": [{"foo": 1}]}"#;
        assert!(matches!(parse_import(raw), Err(LotoError::MalformedImport(_))));
    }
}
