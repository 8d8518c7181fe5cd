use thiserror::Error;

// ---------------------------------------------------------------------------
// Lenient numeric coercion for text cells
// ---------------------------------------------------------------------------

/// A cell that should hold a number but does not.
///
/// Never surfaced to the user: callers recover by treating the cell as
/// missing, the same way `pd.to_numeric(errors="coerce")` would.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("'{raw}' is not a finite number")]
pub struct CoercionError {
    pub raw: String,
}

/// Parse a numeric cell.
///
/// * empty / whitespace-only → `Ok(None)` (missing)
/// * `"1234.5"` or `"1234,5"` → `Ok(Some(1234.5))`
/// * anything else, including `NaN` / `inf` → `Err`
pub fn parse_f64(raw: &str) -> Result<Option<f64>, CoercionError> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let parsed = s
        .parse::<f64>()
        .or_else(|_| s.replace(',', ".").parse::<f64>());
    match parsed {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(CoercionError { raw: s.to_string() }),
    }
}

/// Like [`parse_f64`] but maps coercion failures to `None`.
pub fn lenient_f64(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    match parse_f64(raw) {
        Ok(v) => v,
        Err(e) => {
            log::trace!("treating cell as missing: {e}");
            None
        }
    }
}

/// Whole, non-negative counts such as the number of rooms (`"3"` or `"3.0"`).
pub fn lenient_count(raw: Option<&str>) -> Option<u32> {
    lenient_f64(raw)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as u32)
}
