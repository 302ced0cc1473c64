#![deny(missing_docs)]
#![doc = "Config, fingerprinting and command line helpers shared by the mead tools."]

pub mod args;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod hash;
pub mod logging;

pub use args::{apply_extra_args, infer_type_or_str, parse_extra_args, ExtraArgValue, ExtraArgs};
pub use config::{
    convert_path, expand_user, get_mead_settings, index_by_label, read_config_file,
    read_config_file_or_json, str2bool, value_to_bool, write_json, ConfigSource,
};
pub use dataset::{get_dataset_from_key, parse_date, print_dataset_info, KNOWN_DATE_FORMATS};
pub use errors::{ErrorInfo, MeadError};
pub use hash::{
    hash_config, order_json, remove_extra_keys, to_dumps_string, ExclusionKeys, KeyPath,
    DEFAULT_EXCLUDED_KEYS,
};
pub use logging::{
    build_log_config, configure_logger, encoder_pattern, get_logging_level, install,
    prepare_logging_config, REQUIRED_LOGGING_KEYS,
};
