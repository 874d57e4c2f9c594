//! Name-based invocation.
//!
//! `invoke` is the string-in, JSON-out surface a chaincode shim calls: a
//! function name plus positional string arguments. It checks the name and
//! arity, calls the typed method, and encodes the result.

use std::fmt;
use std::str::FromStr;

use permit_core::errors::CoreError;
use permit_core::identity::IdentityResolver;
use permit_store::LedgerStore;
use serde::Serialize;

use crate::contract::PermitContract;
use crate::error::ContractError;

/// Every operation `invoke` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractFunction {
    CreatePermit,
    UpdateStatus,
    AppendEvidence,
    GetById,
    Exists,
    ListByStatus,
    ListByOrganization,
    GetHistory,
    GetHistoryEntries,
    ListAll,
}

impl ContractFunction {
    pub const ALL: [Self; 10] = [
        Self::CreatePermit,
        Self::UpdateStatus,
        Self::AppendEvidence,
        Self::GetById,
        Self::Exists,
        Self::ListByStatus,
        Self::ListByOrganization,
        Self::GetHistory,
        Self::GetHistoryEntries,
        Self::ListAll,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatePermit => "CreatePermit",
            Self::UpdateStatus => "UpdateStatus",
            Self::AppendEvidence => "AppendEvidence",
            Self::GetById => "GetById",
            Self::Exists => "Exists",
            Self::ListByStatus => "ListByStatus",
            Self::ListByOrganization => "ListByOrganization",
            Self::GetHistory => "GetHistory",
            Self::GetHistoryEntries => "GetHistoryEntries",
            Self::ListAll => "ListAll",
        }
    }

    /// Number of positional arguments the function takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::ListAll => 0,
            Self::GetById
            | Self::Exists
            | Self::ListByStatus
            | Self::ListByOrganization
            | Self::GetHistory
            | Self::GetHistoryEntries => 1,
            Self::CreatePermit | Self::UpdateStatus => 2,
            Self::AppendEvidence => 3,
        }
    }

    /// Whether the function writes to the ledger.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::CreatePermit | Self::UpdateStatus | Self::AppendEvidence
        )
    }
}

impl fmt::Display for ContractFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractFunction {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|function| function.as_str() == s)
            .ok_or_else(|| ContractError::validation("invoke", format!("unknown function '{s}'")))
    }
}

fn to_json<T: Serialize>(
    function: ContractFunction,
    value: &T,
) -> Result<serde_json::Value, ContractError> {
    serde_json::to_value(value).map_err(|e| {
        ContractError::storage(format!("{function}: encode result"), CoreError::Codec(e))
    })
}

impl<L: LedgerStore> PermitContract<L> {
    /// Call `function` with positional `args` and return its result as JSON.
    ///
    /// Results are a permit record, a list of records, a boolean, or a list
    /// of history entries.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unknown function or a wrong argument
    /// count, otherwise whatever the called operation returns.
    pub async fn invoke(
        &self,
        caller: &dyn IdentityResolver,
        function: &str,
        args: &[&str],
    ) -> Result<serde_json::Value, ContractError> {
        let function: ContractFunction = function.parse()?;
        if args.len() != function.arity() {
            return Err(ContractError::validation(
                function.as_str(),
                format!(
                    "expected {} argument(s), got {}",
                    function.arity(),
                    args.len()
                ),
            ));
        }
        tracing::debug!(%function, argc = args.len(), "invoke");

        match (function, args) {
            (ContractFunction::CreatePermit, [id, organization]) => {
                to_json(function, &self.create_permit(caller, id, organization).await?)
            }
            (ContractFunction::UpdateStatus, [id, status]) => {
                to_json(function, &self.update_status(caller, id, status).await?)
            }
            (ContractFunction::AppendEvidence, [id, filename, digest]) => to_json(
                function,
                &self.append_evidence(caller, id, filename, digest).await?,
            ),
            (ContractFunction::GetById, [id]) => to_json(function, &self.get_by_id(id).await?),
            (ContractFunction::Exists, [id]) => to_json(function, &self.exists(id).await?),
            (ContractFunction::ListByStatus, [status]) => {
                to_json(function, &self.list_by_status(status).await?)
            }
            (ContractFunction::ListByOrganization, [organization]) => {
                to_json(function, &self.list_by_organization(organization).await?)
            }
            (ContractFunction::GetHistory, [id]) => to_json(function, &self.get_history(id).await?),
            (ContractFunction::GetHistoryEntries, [id]) => {
                to_json(function, &self.get_history_entries(id).await?)
            }
            (ContractFunction::ListAll, []) => to_json(function, &self.list_all().await?),
            _ => Err(ContractError::validation(
                function.as_str(),
                "argument count mismatch",
            )),
        }
    }
}
