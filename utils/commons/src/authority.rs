use crate::errors::CustomContractError;
use concordium_std::*;

/// Administrative access lists. Admins manage both lists and hold every
/// right; maintainers manage only the maintainer list.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct Authority<S: HasStateApi> {
    admins: StateSet<Address, S>,
    maintainers: StateSet<Address, S>,
}

/// Single change to the authority lists.
#[derive(Debug, Serialize, SchemaType)]
pub enum AuthorityAction {
    AddAdmin(Address),
    RemoveAdmin(Address),
    AddMaintainer(Address),
    RemoveMaintainer(Address),
}

#[derive(Debug, Serialize, SchemaType)]
pub enum AuthorityField {
    Admin,
    Maintainer,
}

/// Paginated view into one of the authority lists.
#[derive(Debug, Serialize, SchemaType)]
pub struct AuthorityViewParams {
    pub field: AuthorityField,
    pub skip: u32,
    pub show: u32,
}

impl<S: HasStateApi> Authority<S> {
    pub fn new(state_builder: &mut StateBuilder<S>, admin: Address) -> Self {
        let mut admins = state_builder.new_set();
        admins.insert(admin);
        Self {
            admins,
            maintainers: state_builder.new_set(),
        }
    }

    pub fn has_admin_rights(&self, address: &Address) -> bool {
        self.admins.contains(address)
    }

    pub fn has_maintainer_rights(&self, address: &Address) -> bool {
        self.maintainers.contains(address) || self.has_admin_rights(address)
    }

    pub fn handle_update(
        &mut self,
        sender: Address,
        action: AuthorityAction,
    ) -> Result<(), CustomContractError> {
        match action {
            AuthorityAction::AddAdmin(address) => {
                ensure!(
                    self.has_admin_rights(&sender),
                    CustomContractError::Unauthorized
                );
                self.admins.insert(address);
            }
            AuthorityAction::RemoveAdmin(address) => {
                ensure!(
                    self.has_admin_rights(&sender),
                    CustomContractError::Unauthorized
                );
                self.admins.remove(&address);
            }
            AuthorityAction::AddMaintainer(address) => {
                ensure!(
                    self.has_maintainer_rights(&sender),
                    CustomContractError::Unauthorized
                );
                self.maintainers.insert(address);
            }
            AuthorityAction::RemoveMaintainer(address) => {
                ensure!(
                    self.has_maintainer_rights(&sender),
                    CustomContractError::Unauthorized
                );
                self.maintainers.remove(&address);
            }
        }
        Ok(())
    }

    pub fn handle_view(&self, view: AuthorityViewParams) -> Vec<Address> {
        let list = match view.field {
            AuthorityField::Admin => &self.admins,
            AuthorityField::Maintainer => &self.maintainers,
        };
        list.iter()
            .skip(view.skip as usize)
            .take(view.show as usize)
            .map(|a| *a)
            .collect()
    }
}
