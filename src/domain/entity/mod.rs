pub mod registry;
pub mod user;

pub trait Entity {
    fn ident(&self) -> i32;
}

/// A persisted record: the storage assigned id and the entity state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCtl<State> {
    id: i32,
    state: State,
}

impl<State> Entity for EntityCtl<State> {
    fn ident(&self) -> i32 {
        self.id
    }
}

impl<State> EntityCtl<State> {
    pub fn restore(id: i32, state: State) -> Self {
        Self { id, state }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn into_state(self) -> State {
        self.state
    }
}

macro_rules! state_ref {
    ($prop:ident, $rtrn:ty) => {
        pub fn $prop(&self) -> &$rtrn {
            &self.state().$prop
        }
    };
}

pub(self) use state_ref;
