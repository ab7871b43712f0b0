//! Collections the service needs, with their key schema and lookup index.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryIndex {
    pub name: &'static str,
    pub key: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionDescriptor {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub index: Option<SecondaryIndex>,
    pub read_capacity: i64,
    pub write_capacity: i64,
}

impl CollectionDescriptor {
    /// Key attribute of the named index, if this collection defines it.
    pub fn index_key(&self, index_name: &str) -> Option<&'static str> {
        self.index
            .filter(|idx| idx.name == index_name)
            .map(|idx| idx.key)
    }
}

pub const USER_EMAIL_INDEX: &str = "EmailIndex";
pub const TASK_OWNER_INDEX: &str = "UserIdIndex";

pub const USERS: CollectionDescriptor = CollectionDescriptor {
    name: "Users",
    primary_key: "id",
    index: Some(SecondaryIndex {
        name: USER_EMAIL_INDEX,
        key: "email",
    }),
    read_capacity: 5,
    write_capacity: 5,
};

pub const TASKS: CollectionDescriptor = CollectionDescriptor {
    name: "Tasks",
    primary_key: "id",
    index: Some(SecondaryIndex {
        name: TASK_OWNER_INDEX,
        key: "userId",
    }),
    read_capacity: 5,
    write_capacity: 5,
};

/// Provisioning order matters: tasks reference users.
pub const REQUIRED: [CollectionDescriptor; 2] = [USERS, TASKS];
