//! Registration-code refresh: ERP code lists → shared [`CodeCatalog`].

use chrono::{DateTime, Utc};
use tracing::info;

use rollcall_core::{CodeCatalog, CodeId, RegistrationCode, RegistrationCodeDictionary};
use rollcall_erp::ErpClient;

use crate::error::SyncError;

/// Sizes of the dictionaries just published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodesRefreshed {
    pub present: usize,
    pub absence: usize,
}

/// Fetch both code lists and swap them into `catalog`.
///
/// Both lists are fetched before either is published, so a failed fetch
/// leaves the catalog as it was.
pub fn refresh_codes<E: ErpClient + ?Sized>(
    erp: &E,
    catalog: &CodeCatalog,
    now: DateTime<Utc>,
) -> Result<CodesRefreshed, SyncError> {
    let present = erp.get_registration_present_codes()?;
    let absence = erp.get_registration_absence_codes()?;

    let present = RegistrationCodeDictionary::new(
        present.present_codes.into_iter().map(|c| RegistrationCode {
            id: CodeId(c.id),
            code: c.code,
            name: c.name,
            is_absence_code: false,
        }),
        now,
    );
    let absence = RegistrationCodeDictionary::new(
        absence.absence_codes.into_iter().map(|c| RegistrationCode {
            id: CodeId(c.id),
            code: c.code,
            name: c.name,
            is_absence_code: true,
        }),
        now,
    );

    let refreshed = CodesRefreshed {
        present: present.len(),
        absence: absence.len(),
    };
    catalog.replace_present(present);
    catalog.replace_absence(absence);
    info!(present = refreshed.present, absence = refreshed.absence, "registration codes refreshed");
    Ok(refreshed)
}
