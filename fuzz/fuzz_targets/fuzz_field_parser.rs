#![no_main]

use libfuzzer_sys::fuzz_target;

use domain::policy::entity::FieldName;
use domain::policy::enumeration::EnumerationTables;
use domain::policy::parser::parse_field;

// Layout:
//   [0]  = field selector
//   rest = raw value (lossy UTF-8)
fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let field = FieldName::ALL[selector as usize % FieldName::ALL.len()];
    let raw = String::from_utf8_lossy(rest);
    let tables = EnumerationTables::standard();

    if let Some(value) = parse_field(field, &raw, &tables) {
        // Parsed values must render without panicking.
        let _ = value.to_string();
    }
});
