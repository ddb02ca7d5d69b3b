//! Service error to HTTP status mapping.

use std::error::Error;

use salvo::http::StatusError;
use tracing::error;

use souq_app::errors::{Classify, ErrorKind};

/// Render a service error with the status its category maps to.
///
/// Internal failures are logged with their source chain and answered with a bare 500.
pub(crate) fn into_status_error<E>(error: E) -> StatusError
where
    E: Classify + Error,
{
    let brief = error.to_string();

    match error.kind() {
        ErrorKind::Validation => StatusError::bad_request().brief(brief),
        ErrorKind::NotFound => StatusError::not_found().brief(brief),
        ErrorKind::Conflict => StatusError::conflict().brief(brief),
        ErrorKind::Authorization => StatusError::forbidden().brief(brief),
        ErrorKind::Internal => {
            match error.source() {
                Some(source) => error!("{brief}: {source}"),
                None => error!("{brief}"),
            }

            StatusError::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use souq::{orders::OrderError, shipments::ShipmentError};
    use souq_app::domain::{
        orders::OrdersServiceError, shipments::ShipmentsServiceError,
        withdrawals::WithdrawalsServiceError,
    };

    use super::*;

    #[test]
    fn categories_map_to_statuses() {
        let cases = [
            (
                into_status_error(WithdrawalsServiceError::MissingDestination),
                StatusCode::BAD_REQUEST,
            ),
            (
                into_status_error(OrdersServiceError::NotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                into_status_error(OrdersServiceError::Forbidden),
                StatusCode::FORBIDDEN,
            ),
            (
                into_status_error(ShipmentsServiceError::Shipment(ShipmentError::AlreadyTaken)),
                StatusCode::CONFLICT,
            ),
            (
                into_status_error(OrdersServiceError::Order(OrderError::UnknownStatus(
                    "lost".to_string(),
                ))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.code, status, "unexpected status for {error:?}");
        }
    }
}
