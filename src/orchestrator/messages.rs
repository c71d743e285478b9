//! Operator-facing progress text.

pub const FIND_APP_FOLDER: &str = "Looking for app folder...";
pub const FIND_UPDATE_FOLDER: &str = "Looking for update folder...";
pub const UPDATING: &str = "Updating... Please wait";

pub fn unpacking(entry: &str) -> String {
    format!("Unpacking {entry}")
}

pub fn waiting_for_exit(name: &str) -> String {
    format!("Waiting for {name} to exit...")
}

pub fn completed(name: &str) -> String {
    format!("Update complete! Starting {name}")
}

pub fn up_to_date(name: &str) -> String {
    format!("{name} is already up to date")
}

pub fn failed(name: &str) -> String {
    format!("Update failed. Restart {name} and try again.")
}

pub fn app_folder_not_found(name: &str) -> String {
    format!("Update failed. App folder not found. Restart {name} and try again.")
}

pub fn no_update_downloaded(name: &str) -> String {
    format!("Update failed. No update has been downloaded. Restart {name} and try again.")
}

pub fn extraction_failed(name: &str) -> String {
    format!("Update failed. The update package could not be unpacked. Restart {name} and try again.")
}
