//! Diagnostic JSON rendering of resolved requests.

mod common;

use common::personnel_model;
use odata_uri::debug::DebugInfo;
use odata_uri::uri::UriParser;
use pretty_assertions::assert_eq;
use serde_json::Value;

fn debug_block(segments: &[&str], options: &[(&str, &str)]) -> Value {
    let model = personnel_model();
    let info = UriParser::new(model.as_ref())
        .parse(segments, options)
        .unwrap();
    DebugInfo::from_uri_info(&info)
}

#[test]
fn renders_the_resolved_target_and_keys() {
    let block = debug_block(&["Employees", "5", "Orders"], &[]);
    assert_eq!(block["startEntitySet"], "Employees");
    assert_eq!(block["targetEntitySet"], "Orders");
    assert_eq!(block["targetEntityType"], "Personnel.Order");
    assert_eq!(block["keyPredicates"][0]["property"], "EmployeeId");
    assert_eq!(block["navigation"][0], "Orders");
}

#[test]
fn renders_filter_and_orderby_trees() {
    let block = debug_block(
        &["Employees"],
        &[
            ("$filter", "Price gt 10 and Price lt 100"),
            ("$orderby", "Name desc"),
        ],
    );

    let expression = &block["filter"]["expression"];
    assert_eq!(expression["nodeType"], "binary");
    assert_eq!(expression["operator"], "and");
    assert_eq!(expression["type"], "Edm.Boolean");
    assert_eq!(expression["left"]["operator"], "gt");
    assert_eq!(expression["left"]["left"]["nodeType"], "property");
    assert_eq!(expression["left"]["left"]["name"], "Price");
    assert_eq!(expression["left"]["right"]["type"], "Edm.Int32");

    let orders = &block["orderby"]["orders"];
    assert_eq!(orders[0]["nodeType"], "order");
    assert_eq!(orders[0]["sortorder"], "desc");
    assert_eq!(orders[0]["expression"]["name"], "Name");
}

#[test]
fn absent_options_degrade_to_null_not_errors() {
    let block = debug_block(&["Employees"], &[]);
    assert_eq!(block["filter"], Value::Null);
    assert_eq!(block["orderby"], Value::Null);
    // The rest of the block is still populated.
    assert_eq!(block["targetEntitySet"], "Employees");
}

#[test]
fn renders_methods_and_members() {
    let block = debug_block(
        &["Employees"],
        &[("$filter", "startswith(Manager/Name,'A')")],
    );
    let expression = &block["filter"]["expression"];
    assert_eq!(expression["nodeType"], "method");
    assert_eq!(expression["operator"], "startswith");
    assert_eq!(expression["parameters"][0]["nodeType"], "member");
    assert_eq!(expression["parameters"][0]["type"], "Edm.String");
    assert_eq!(expression["parameters"][1]["value"], "'A'");
}
