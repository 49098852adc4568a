mod controls;
mod details;
mod panels;

pub(super) use panels::dataset_picker;
