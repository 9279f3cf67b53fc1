pub(crate) mod data {
    pub(crate) mod datasources {
        pub(crate) mod status_update_notification_datasource;
        pub(crate) mod verify_receipt_datasource;
    }
    pub(crate) mod models {
        pub(crate) mod apple_time;
        pub(crate) mod status_update_notifications {
            pub(crate) mod notification_model;
            pub(crate) mod unified_receipt_model;
        }
        pub(crate) mod verify_receipt {
            pub(crate) mod pending_renewal_info_model;
            pub(crate) mod receipt_info_model;
            pub(crate) mod receipt_payload;
            pub(crate) mod verify_receipt_request_model;
            pub(crate) mod verify_receipt_response_model;
        }
    }
    pub(crate) mod repositories {
        pub(crate) mod receipt_repository_impl;
    }
}

pub mod domain {
    pub mod entities {
        pub mod event;
        pub mod note;
        pub mod receipt_info;
        pub mod subscription;
        pub mod verify_status;
    }
    pub mod listeners {
        pub mod event_listener;
    }
    pub mod repositories {
        pub mod receipt_repository;
        pub mod subscription_repository;
    }
}

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod listeners;
pub mod memory_store;
pub mod scanner;
pub mod server;
pub mod util;
