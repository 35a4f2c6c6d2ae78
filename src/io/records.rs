//! Persisted record schema and load-time upcasting
//!
//! Every persisted record carries a `schema_version`. Records are upcast to
//! the current schema once, when they are loaded, before any business logic
//! sees them:
//!
//! - **Schema 0**: legacy files without a version stamp (Portuguese field
//!   names, float amounts, naive timestamps, history as formatted strings)
//! - **Schema 1**: the current layout of [`Account`], [`CreditCard`] and
//!   [`AuditEntry`]; optional fields missing from a record get defaults
//!
//! Records that still do not fit after upcasting are rejected at this boundary.

use crate::core::traits::Versioned;
use crate::types::{Account, AuditAction, AuditEntry, CreditCard, StoreError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::str::FromStr;

/// Current on-disk schema
pub const SCHEMA_VERSION: u64 = 1;

/// Field holding the schema version of a stored record
pub const SCHEMA_FIELD: &str = "schema_version";

/// A record type that can live in a keyed store
pub trait Record: Versioned + Clone + Serialize + DeserializeOwned {
    /// Kind name used in file names and error messages
    const KIND: &'static str;

    /// Bring a raw stored record up to the current schema
    fn upcast(key: &str, raw: Value) -> Result<Value, StoreError>;
}

/// Decode a stored record: upcast, then deserialize
pub fn decode<T: Record>(key: &str, raw: Value) -> Result<T, StoreError> {
    let upcast = T::upcast(key, raw)?;
    serde_json::from_value(upcast).map_err(|e| StoreError::malformed(T::KIND, key, e.to_string()))
}

/// Encode a record with its schema version
pub fn encode<T: Record>(record: &T) -> Result<Value, StoreError> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut value {
        map.insert(SCHEMA_FIELD.to_string(), json!(SCHEMA_VERSION));
    }
    Ok(value)
}

fn object(kind: &str, key: &str, raw: Value) -> Result<Map<String, Value>, StoreError> {
    match raw {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::malformed(
            kind,
            key,
            format!("expected an object, found {other}"),
        )),
    }
}

fn schema_of(map: &Map<String, Value>) -> u64 {
    map.get(SCHEMA_FIELD).and_then(Value::as_u64).unwrap_or(0)
}

fn rename(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = map.remove(from) {
        map.entry(to.to_string()).or_insert(value);
    }
}

/// Parse the naive ISO timestamps legacy files carry (local time,
/// no offset); they are taken as UTC.
fn legacy_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::from_str(text).ok().map(|naive| naive.and_utc())
}

fn legacy_date(value: &Value) -> Option<NaiveDate> {
    legacy_datetime(value)
        .map(|dt| dt.date_naive())
        .or_else(|| value.as_str().and_then(|s| NaiveDate::from_str(s).ok()))
}

fn normalize_timestamp(map: &mut Map<String, Value>, field: &str) {
    if let Some(dt) = map.get(field).and_then(legacy_datetime) {
        map.insert(field.to_string(), json!(dt));
    }
}

fn decimal_of(value: Option<&Value>) -> Option<Decimal> {
    value.and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// `"[10/03/2024 14:30:00] DEPÓSITO: +R$ 150.00"` → structured history entry
fn legacy_history_entry(line: &str, fallback: DateTime<Utc>) -> Value {
    let (timestamp, description) = match line.strip_prefix('[').and_then(|s| s.split_once("] ")) {
        Some((stamp, rest)) => (
            NaiveDateTime::parse_from_str(stamp, "%d/%m/%Y %H:%M:%S")
                .map(|naive| naive.and_utc())
                .unwrap_or(fallback),
            rest,
        ),
        None => (fallback, line),
    };

    let amount = description
        .rfind("R$ ")
        .and_then(|pos| {
            let value = Decimal::from_str(description[pos + 3..].trim()).ok()?;
            let negative = description[..pos].ends_with('-');
            Some(if negative { -value } else { value })
        })
        .unwrap_or(Decimal::ZERO);

    json!({
        "timestamp": timestamp,
        "description": description,
        "amount": amount,
    })
}

impl Record for Account {
    const KIND: &'static str = "account";

    fn upcast(key: &str, raw: Value) -> Result<Value, StoreError> {
        let mut map = object(Self::KIND, key, raw)?;

        if schema_of(&map) == 0 {
            rename(&mut map, "saldo", "balance");
            rename(&mut map, "pontos", "reward_points");
            rename(&mut map, "data_cadastro", "created_at");
            for credential in ["senha", "pergunta_secreta", "resposta_secreta"] {
                map.remove(credential);
            }
            normalize_timestamp(&mut map, "created_at");

            let created_at = map
                .get("created_at")
                .and_then(legacy_datetime)
                .ok_or_else(|| StoreError::malformed(Self::KIND, key, "missing created_at"))?;

            if let Some(Value::Array(lines)) = map.remove("historico") {
                let history: Vec<Value> = lines
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|line| legacy_history_entry(line, created_at))
                    .collect();
                map.insert("history".to_string(), Value::Array(history));
            }
        }

        map.entry("username").or_insert_with(|| json!(key));
        map.entry("reward_points").or_insert_with(|| json!(0));
        map.entry("history").or_insert_with(|| json!([]));
        map.entry("version").or_insert_with(|| json!(0));

        Ok(Value::Object(map))
    }
}

/// Map a legacy installment (`parcela`) onto the current layout
fn legacy_installment(parcela: &Value, purchases: &[Value]) -> Option<Value> {
    let description = parcela.get("descricao")?.as_str()?.to_string();
    let amount = decimal_of(parcela.get("valor"))?;
    let sequence = parcela.get("numero")?.as_u64()?;
    let due_date = legacy_date(parcela.get("data_vencimento")?)?;
    let paid = parcela.get("paga").and_then(Value::as_bool).unwrap_or(false);
    let moved = parcela
        .get("moved_to_bill")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let purchase = purchases
        .iter()
        .find(|c| c.get("descricao").and_then(Value::as_str) == Some(description.as_str()));
    let count = purchase
        .and_then(|c| c.get("parcelas"))
        .and_then(Value::as_u64)
        .unwrap_or(sequence);
    let purchase_amount = purchase
        .and_then(|c| decimal_of(c.get("valor_original")))
        .unwrap_or(amount * Decimal::from(count));

    let paid_amount = if paid { amount } else { Decimal::ZERO };

    Some(json!({
        "sequence": sequence,
        "count": count.max(sequence),
        "amount": amount,
        "paid_amount": paid_amount,
        "due_date": due_date,
        "moved_to_bill": moved || paid,
        "paid": paid,
        "purchase_amount": purchase_amount,
        "description": description,
    }))
}

impl Record for CreditCard {
    const KIND: &'static str = "card";

    fn upcast(key: &str, raw: Value) -> Result<Value, StoreError> {
        let mut map = object(Self::KIND, key, raw)?;

        if schema_of(&map) == 0 {
            rename(&mut map, "usuario", "owner");
            rename(&mut map, "limite", "limit");
            rename(&mut map, "fatura_atual", "current_bill");
            rename(&mut map, "data_criacao", "created_at");
            map.remove("usado");
            normalize_timestamp(&mut map, "created_at");

            if !map.contains_key("last_bill_cycle_date") {
                let cycle = map
                    .get("created_at")
                    .and_then(legacy_date)
                    .ok_or_else(|| StoreError::malformed(Self::KIND, key, "missing created_at"))?;
                map.insert("last_bill_cycle_date".to_string(), json!(cycle));
            }

            let purchases = match map.remove("compras") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            if let Some(Value::Array(parcelas)) = map.remove("parcelas") {
                let installments = parcelas
                    .iter()
                    .map(|p| {
                        legacy_installment(p, &purchases).ok_or_else(|| {
                            StoreError::malformed(Self::KIND, key, format!("bad installment {p}"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                map.insert("installments".to_string(), Value::Array(installments));
            }
        }

        map.entry("number").or_insert_with(|| json!(key));
        map.entry("current_bill").or_insert_with(|| json!(Decimal::ZERO));
        map.entry("installments").or_insert_with(|| json!([]));
        map.entry("version").or_insert_with(|| json!(0));

        Ok(Value::Object(map))
    }
}

fn legacy_action(acao: &str) -> Option<AuditAction> {
    Some(match acao {
        "DEPOSITO" => AuditAction::Deposit,
        "SAQUE" => AuditAction::Withdrawal,
        "TRANSFERENCIA" => AuditAction::Transfer,
        "TROCA_PONTOS" => AuditAction::PointsRedeemed,
        "CARTAO_CRIADO" => AuditAction::CardIssued,
        "COMPRA_CARTAO" => AuditAction::CardPurchase,
        "PAGAMENTO_FATURA" => AuditAction::BillPayment,
        "EMPRESTIMO" => AuditAction::LoanTaken,
        "PAGAMENTO_EMPRESTIMO" => AuditAction::LoanInstallmentPaid,
        "QUITACAO_EMPRESTIMO" => AuditAction::LoanPaidOff,
        "INVESTIMENTO" => AuditAction::InvestmentMade,
        "RESGATE" => AuditAction::InvestmentRedeemed,
        _ => return None,
    })
}

/// Upcast one audit entry; `None` for legacy actions this system does not model
pub fn upcast_audit_entry(raw: Value, schema: u64) -> Option<AuditEntry> {
    if schema >= 1 {
        return serde_json::from_value(raw).ok();
    }

    let timestamp = raw.get("timestamp").and_then(legacy_datetime)?;
    let account = raw.get("usuario")?.as_str()?.to_string();
    let action = legacy_action(raw.get("acao")?.as_str()?)?;
    let details = raw
        .get("detalhes")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(AuditEntry {
        timestamp,
        account,
        action,
        details,
    })
}
