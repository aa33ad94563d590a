//! Diesel schema for task persistence.

diesel::table! {
    /// Approval task records.
    approval_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Free-text task name.
        #[max_length = 255]
        name -> Varchar,
        /// Free-text task description.
        description -> Text,
        /// Identity of the creator.
        #[max_length = 255]
        initiator -> Varchar,
        /// Coordinators in turn order.
        coordinators -> Array<Text>,
        /// Zero-based index of the current turn-holder.
        next_index -> Int4,
        /// Status code.
        status -> Int2,
        /// Optimistic concurrency revision.
        revision -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
