#![no_main]

//! Drives one update segment with arbitrary attribute names/values and checks
//! that no recognized handler attribute reaches the wire.

use core_types::{ComponentRef, RequestContext};
use csp::{CspConfig, CspPartialResponseWriter, CspStateHandle, is_event_attribute};
use libfuzzer_sys::fuzz_target;
use markup::{MarkupWriter, PartialResponseWriter, XmlPartialResponseWriter};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let request = RequestContext::new();
    let Ok(mut w) = CspPartialResponseWriter::new(
        XmlPartialResponseWriter::new(String::new()),
        &request,
        CspStateHandle::new(),
        CspConfig {
            execute_scripts_on_end_document: false,
            ..CspConfig::default()
        },
    ) else {
        return;
    };
    let owner = ComponentRef::new("fuzz");
    let mut handler_names = Vec::new();
    w.start_document().expect("start document");
    w.start_update("fuzz").expect("start update");
    for line in input.lines() {
        let (name, value) = line.split_once('=').unwrap_or((line, ""));
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphabetic()) {
            w.start_element("div", Some(&owner)).expect("start element");
            continue;
        }
        if value.contains('=') {
            continue;
        }
        if is_event_attribute(name) {
            handler_names.push(name.to_string());
        }
        if w.write_attribute(name, value, None).is_err() {
            return;
        }
    }
    if w.end_update().is_err() {
        return;
    }
    let wire = w.into_inner().into_inner();
    for name in handler_names {
        assert!(!wire.contains(&format!(" {name}=")), "{name} leaked: {wire}");
    }
});
