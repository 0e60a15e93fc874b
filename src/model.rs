use bigdecimal::BigDecimal;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{ser::SerializeStruct, Serialize};

/// Payment methods the APP export is allowed to carry. Cash and everything
/// else is excluded upstream, before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Pix,
    Cartao,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "Pix",
            PaymentMethod::Cartao => "Cartão",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Pix" => Some(PaymentMethod::Pix),
            "Cartão" => Some(PaymentMethod::Cartao),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

impl Serialize for PaymentMethod {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

/// One point-of-sale payment event from the APP export.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub filial: String,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    /// None when the source text never parsed; such a transaction is
    /// infinitely distant for the time window.
    pub created: Option<NaiveDateTime>,
}

/// One back-office sale from the Trier export. The export carries
/// time-of-day only, no date.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    pub filial: String,
    pub sale_number: String,
    pub customer: String,
    pub net_total: BigDecimal,
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Exact,
    Adjusted,
    Divergent,
    Unmatched,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Exact => "OK",
            Status::Adjusted => "OK (AJUSTE)",
            Status::Divergent => "VALOR DIVERGENTE",
            Status::Unmatched => "SEM CORRESPONDÊNCIA",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Exact | Status::Adjusted)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

impl Serialize for Status {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

/// APP side of a resolved match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedSide {
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    pub created: Option<NaiveDateTime>,
}

impl Serialize for MatchedSide {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("MatchedSide", 3)?;
        state.serialize_field("amount", &format!("{}", self.amount.with_scale(2)))?;
        state.serialize_field("method", &self.method)?;
        state.serialize_field(
            "created",
            &self
                .created
                .map(|c| c.format("%d/%m/%Y %H:%M:%S").to_string()),
        )?;
        state.end()
    }
}

/// One report row. Every summary produces exactly one of these, matched
/// or not.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub filial: String,
    pub sale_number: String,
    pub customer: String,
    pub time: Option<NaiveTime>,
    pub net_total: BigDecimal,
    pub app: Option<MatchedSide>,
    /// Signed, APP minus Trier.
    pub value_diff: Option<BigDecimal>,
    pub value_diff_abs: Option<BigDecimal>,
    pub time_diff_minutes: Option<i64>,
    pub value_within: bool,
    pub time_within: Option<bool>,
    pub status: Status,
}

impl MatchResult {
    pub fn unmatched(summary: &SalesSummary) -> Self {
        Self {
            filial: summary.filial.clone(),
            sale_number: summary.sale_number.clone(),
            customer: summary.customer.clone(),
            time: summary.time,
            net_total: summary.net_total.clone(),
            app: None,
            value_diff: None,
            value_diff_abs: None,
            time_diff_minutes: None,
            value_within: false,
            time_within: None,
            status: Status::Unmatched,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.app.is_some()
    }
}

impl Serialize for MatchResult {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("MatchResult", 12)?;
        state.serialize_field("filial", &self.filial)?;
        state.serialize_field("sale_number", &self.sale_number)?;
        state.serialize_field("customer", &self.customer)?;
        state.serialize_field("time", &self.time.map(|t| t.format("%H:%M:%S").to_string()))?;
        state.serialize_field("net_total", &format!("{}", self.net_total.with_scale(2)))?;
        state.serialize_field("app", &self.app)?;
        state.serialize_field(
            "value_diff",
            &self
                .value_diff
                .as_ref()
                .map(|d| format!("{}", d.with_scale(2))),
        )?;
        state.serialize_field(
            "value_diff_abs",
            &self
                .value_diff_abs
                .as_ref()
                .map(|d| format!("{}", d.with_scale(2))),
        )?;
        state.serialize_field("time_diff_minutes", &self.time_diff_minutes)?;
        state.serialize_field("value_within", &self.value_within)?;
        state.serialize_field("time_within", &self.time_within)?;
        state.serialize_field("status", &self.status)?;
        state.end()
    }
}
