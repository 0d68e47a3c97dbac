use crate::indexer::Amount;

/// Unit string of the native coin's smallest denomination.
pub const LOVELACE: &str = "lovelace";

/// Decimal places between lovelace and ada.
pub const ADA_DECIMALS: u32 = 6;

/// Parse a decimal quantity string into an integer.
///
/// Quantities arrive from the indexer as decimal strings; native-asset
/// supplies exceed `u64`, so everything is parsed into `u128`. Floating-point
/// arithmetic is never used on quantities.
pub fn parse_quantity(quantity: &str) -> Result<u128, String> {
    quantity
        .parse::<u128>()
        .map_err(|e| format!("invalid quantity {:?}: {}", quantity, e))
}

/// Sum all entries of the given unit across a value multiset.
pub fn sum_unit(amounts: &[Amount], unit: &str) -> Result<u128, String> {
    let mut total = 0u128;
    for amount in amounts.iter().filter(|a| a.unit == unit) {
        total = total
            .checked_add(parse_quantity(&amount.quantity)?)
            .ok_or_else(|| format!("quantity overflow summing unit {}", unit))?;
    }
    Ok(total)
}

/// Render a lovelace amount as a fixed-point ada string, e.g. `1.500000`.
pub fn format_lovelace(lovelace: u128) -> String {
    let scale = 10u128.pow(ADA_DECIMALS);
    format!(
        "{}.{:0width$}",
        lovelace / scale,
        lovelace % scale,
        width = ADA_DECIMALS as usize
    )
}
