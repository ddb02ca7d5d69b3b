//! Route templates for span and metric labels.

use uuid::Uuid;

/// Collapse id segments so every order, shipment or return shares one label.
pub(super) fn route_template(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if Uuid::parse_str(segment).is_ok() {
                "{id}"
            } else {
                segment
            }
        })
        .collect();

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_collapsed() {
        assert_eq!(route_template("/"), "/");
        assert_eq!(
            route_template("/shipments/0199a1f2-7c4e-7a51-9d2c-3f1e5b6a7c8d/accept"),
            "/shipments/{id}/accept"
        );
        assert_eq!(route_template("/ledger/balance/"), "/ledger/balance");
    }
}
