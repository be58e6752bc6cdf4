//! Shared test model: a small personnel schema exercising simple, complex,
//! navigation and compound-key shapes.
#![allow(dead_code)]

use odata_uri::edm::{EdmSimpleType, InMemoryModel, ModelBuilder, TypeRef};
use std::sync::Arc;

pub fn personnel_model() -> Arc<InMemoryModel> {
    ModelBuilder::new("Personnel")
        .complex_type(
            "Address",
            vec![
                ("Street", TypeRef::Simple(EdmSimpleType::String)),
                ("City", TypeRef::Simple(EdmSimpleType::String)),
                ("PostalCode", TypeRef::Simple(EdmSimpleType::String)),
            ],
        )
        .entity_type(
            "Order",
            vec!["OrderId"],
            vec![
                ("OrderId", TypeRef::Simple(EdmSimpleType::Int32)),
                ("Total", TypeRef::Simple(EdmSimpleType::Decimal)),
                ("Placed", TypeRef::Simple(EdmSimpleType::DateTime)),
            ],
            vec![("Customer", "Employees", false)],
        )
        .entity_type(
            "Employee",
            vec!["EmployeeId"],
            vec![
                ("EmployeeId", TypeRef::Simple(EdmSimpleType::Int32)),
                ("Name", TypeRef::Simple(EdmSimpleType::String)),
                ("Age", TypeRef::Simple(EdmSimpleType::Byte)),
                ("Price", TypeRef::Simple(EdmSimpleType::Decimal)),
                ("Salary", TypeRef::Simple(EdmSimpleType::Int64)),
                ("Active", TypeRef::Simple(EdmSimpleType::Boolean)),
                ("HireDate", TypeRef::Simple(EdmSimpleType::DateTime)),
                ("BadgeId", TypeRef::Simple(EdmSimpleType::Guid)),
                ("Location", TypeRef::Complex("Address".to_string())),
            ],
            vec![
                ("Orders", "Orders", true),
                ("Manager", "Employees", false),
            ],
        )
        .entity_type(
            "Tag",
            vec!["Word", "Lang"],
            vec![
                ("Word", TypeRef::Simple(EdmSimpleType::String)),
                ("Lang", TypeRef::Simple(EdmSimpleType::String)),
            ],
            Vec::<(&str, &str, bool)>::new(),
        )
        .entity_set("Employees", "Employee")
        .entity_set("Orders", "Order")
        .entity_set("Tags", "Tag")
        .function_import("TopEmployees", "Employees", true)
        .function_import("CompanyFounder", "Employees", false)
        .build()
        .expect("test model is consistent")
}

pub fn employee_type(model: &Arc<InMemoryModel>) -> Arc<odata_uri::edm::EntityType> {
    use odata_uri::edm::EntityDataModel;
    model.entity_type("Personnel.Employee").expect("declared")
}
