//! Integration test for Smithy parser

use findings_mapper_common::{FieldType, HttpMethod, MapperError};
use findings_mapper_parser::{import_smithy, SmithyParser};
use std::io::Write;

const SECURITY_HUB_MODEL: &str = r#"{
    "smithy": "2.0",
    "shapes": {
        "com.amazonaws.securityhub#SecurityHubAPIService": {
            "type": "service",
            "version": "2018-10-26",
            "operations": [
                { "target": "com.amazonaws.securityhub#CreateMembers" },
                { "target": "com.amazonaws.securityhub#ListInvitations" }
            ],
            "resources": [
                { "target": "com.amazonaws.securityhub#ActionTargetResource" }
            ],
            "traits": {
                "aws.api#service": {
                    "sdkId": "SecurityHub",
                    "endpointPrefix": "securityhub"
                },
                "smithy.api#documentation": "Security Hub provides visibility into your security state"
            }
        },
        "com.amazonaws.securityhub#ActionTargetResource": {
            "type": "resource",
            "delete": { "target": "com.amazonaws.securityhub#DeleteActionTarget" }
        },
        "com.amazonaws.securityhub#CreateMembers": {
            "type": "operation",
            "input": { "target": "com.amazonaws.securityhub#CreateMembersRequest" },
            "output": { "target": "com.amazonaws.securityhub#CreateMembersResponse" },
            "errors": [
                { "target": "com.amazonaws.securityhub#InvalidInputException" }
            ],
            "traits": {
                "smithy.api#http": { "method": "POST", "uri": "/members", "code": 200 },
                "smithy.api#documentation": "Creates member accounts"
            }
        },
        "com.amazonaws.securityhub#ListInvitations": {
            "type": "operation",
            "input": { "target": "com.amazonaws.securityhub#ListInvitationsRequest" },
            "output": { "target": "com.amazonaws.securityhub#ListInvitationsResponse" },
            "traits": {
                "smithy.api#http": { "method": "GET", "uri": "/invitations", "code": 200 }
            }
        },
        "com.amazonaws.securityhub#DeleteActionTarget": {
            "type": "operation",
            "input": { "target": "com.amazonaws.securityhub#DeleteActionTargetRequest" },
            "output": { "target": "smithy.api#Unit" },
            "traits": {
                "smithy.api#http": {
                    "method": "DELETE",
                    "uri": "/actionTargets/{ActionTargetArn+}",
                    "code": 200
                }
            }
        },
        "com.amazonaws.securityhub#CreateMembersRequest": {
            "type": "structure",
            "members": {
                "AccountDetails": {
                    "target": "com.amazonaws.securityhub#AccountDetailsList",
                    "traits": { "smithy.api#documentation": "Accounts to add" }
                }
            }
        },
        "com.amazonaws.securityhub#CreateMembersResponse": {
            "type": "structure",
            "members": {
                "UnprocessedAccounts": { "target": "com.amazonaws.securityhub#ResultList" }
            }
        },
        "com.amazonaws.securityhub#AccountDetailsList": {
            "type": "list",
            "member": { "target": "com.amazonaws.securityhub#AccountDetails" }
        },
        "com.amazonaws.securityhub#AccountDetails": {
            "type": "structure",
            "members": {
                "Email": { "target": "com.amazonaws.securityhub#NonEmptyString" },
                "AccountId": {
                    "target": "com.amazonaws.securityhub#AccountId",
                    "traits": { "smithy.api#required": {} }
                }
            },
            "traits": { "smithy.api#documentation": "The details of an Amazon Web Services account." }
        },
        "com.amazonaws.securityhub#ResultList": {
            "type": "list",
            "member": { "target": "com.amazonaws.securityhub#Result" }
        },
        "com.amazonaws.securityhub#Result": {
            "type": "structure",
            "members": {
                "AccountId": { "target": "com.amazonaws.securityhub#AccountId" },
                "ProcessingResult": { "target": "com.amazonaws.securityhub#NonEmptyString" }
            }
        },
        "com.amazonaws.securityhub#ListInvitationsRequest": {
            "type": "structure",
            "members": {
                "MaxResults": {
                    "target": "com.amazonaws.securityhub#MaxResults",
                    "traits": { "smithy.api#httpQuery": "MaxResults" }
                },
                "NextToken": {
                    "target": "com.amazonaws.securityhub#NextToken",
                    "traits": { "smithy.api#httpQuery": "NextToken" }
                },
                "OnlyAssociated": {
                    "target": "smithy.api#Boolean",
                    "traits": { "smithy.api#httpHeader": "X-Only-Associated" }
                }
            }
        },
        "com.amazonaws.securityhub#ListInvitationsResponse": {
            "type": "structure",
            "members": {
                "Invitations": { "target": "com.amazonaws.securityhub#InvitationList" },
                "NextToken": { "target": "com.amazonaws.securityhub#NextToken" }
            }
        },
        "com.amazonaws.securityhub#InvitationList": {
            "type": "list",
            "member": { "target": "com.amazonaws.securityhub#Invitation" }
        },
        "com.amazonaws.securityhub#Invitation": {
            "type": "structure",
            "members": {
                "AccountId": { "target": "com.amazonaws.securityhub#AccountId" },
                "InvitedAt": { "target": "smithy.api#Timestamp" },
                "MemberStatus": { "target": "com.amazonaws.securityhub#MemberStatus" },
                "Attributes": { "target": "com.amazonaws.securityhub#FieldMap" },
                "Score": { "target": "smithy.api#Double" },
                "Seen": { "target": "com.amazonaws.securityhub#SeenCount" }
            }
        },
        "com.amazonaws.securityhub#DeleteActionTargetRequest": {
            "type": "structure",
            "members": {
                "ActionTargetArn": {
                    "target": "com.amazonaws.securityhub#NonEmptyString",
                    "traits": { "smithy.api#httpLabel": {}, "smithy.api#required": {} }
                }
            }
        },
        "com.amazonaws.securityhub#InvalidInputException": {
            "type": "structure",
            "members": {
                "Message": { "target": "com.amazonaws.securityhub#NonEmptyString" },
                "Code": { "target": "com.amazonaws.securityhub#NonEmptyString" }
            },
            "traits": { "smithy.api#error": "client", "smithy.api#httpError": 400 }
        },
        "com.amazonaws.securityhub#FieldMap": {
            "type": "map",
            "key": { "target": "com.amazonaws.securityhub#NonEmptyString" },
            "value": { "target": "com.amazonaws.securityhub#NonEmptyString" }
        },
        "com.amazonaws.securityhub#MemberStatus": {
            "type": "enum",
            "members": {
                "ENABLED": { "target": "smithy.api#Unit", "traits": { "smithy.api#enumValue": "Enabled" } }
            }
        },
        "com.amazonaws.securityhub#AccountId": { "type": "string" },
        "com.amazonaws.securityhub#NonEmptyString": { "type": "string" },
        "com.amazonaws.securityhub#NextToken": { "type": "string" },
        "com.amazonaws.securityhub#MaxResults": { "type": "integer" },
        "com.amazonaws.securityhub#SeenCount": { "type": "long" }
    }
}"#;

#[test]
fn test_parse_security_hub_model() {
    let catalog = SmithyParser::from_json(SECURITY_HUB_MODEL)
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(catalog.service, "securityhub");
    assert_eq!(catalog.version.as_deref(), Some("2018-10-26"));
    assert_eq!(
        catalog.endpoint(None),
        "securityhub.us-east-1.amazonaws.com"
    );

    // One record per structure, error shapes included
    assert_eq!(catalog.records.len(), 9);
    assert!(catalog.records.contains("InvalidInputException"));
}

#[test]
fn test_members_sorted_and_typed() {
    let catalog = SmithyParser::from_json(SECURITY_HUB_MODEL)
        .unwrap()
        .parse()
        .unwrap();

    let details = catalog.records.get("AccountDetails").unwrap();
    let names: Vec<&str> = details.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["AccountId", "Email"]);
    assert_eq!(
        details.description.as_deref(),
        Some("The details of an Amazon Web Services account.")
    );

    let request = catalog.records.get("CreateMembersRequest").unwrap();
    assert_eq!(
        request.fields[0].field_type,
        FieldType::list(FieldType::record("AccountDetails"))
    );
    assert_eq!(request.fields[0].description.as_deref(), Some("Accounts to add"));

    let invitation = catalog.records.get("Invitation").unwrap();
    let field_type = |name: &str| invitation.get_field(name).unwrap().field_type.clone();
    assert_eq!(field_type("InvitedAt"), FieldType::timestamp());
    assert_eq!(field_type("MemberStatus"), FieldType::string());
    assert_eq!(field_type("Attributes"), FieldType::map(FieldType::string()));
    assert_eq!(field_type("Score"), FieldType::double());
    assert_eq!(field_type("Seen"), FieldType::long());
}

#[test]
fn test_operation_bindings() {
    let catalog = SmithyParser::from_json(SECURITY_HUB_MODEL)
        .unwrap()
        .parse()
        .unwrap();

    let names: Vec<&str> = catalog.operations.iter().map(|op| op.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["CreateMembers", "DeleteActionTarget", "ListInvitations"]
    );

    let create = catalog.operation("CreateMembers").unwrap();
    assert_eq!(create.method, HttpMethod::Post);
    assert_eq!(create.uri, "/members");
    assert_eq!(create.input.as_deref(), Some("CreateMembersRequest"));
    assert_eq!(create.output.as_deref(), Some("CreateMembersResponse"));
    assert_eq!(create.description.as_deref(), Some("Creates member accounts"));

    let list = catalog.operation("ListInvitations").unwrap();
    assert_eq!(list.method, HttpMethod::Get);
    let query: Vec<(&str, &str)> = list
        .query
        .iter()
        .map(|q| (q.param.as_str(), q.field.as_str()))
        .collect();
    assert_eq!(
        query,
        vec![("MaxResults", "MaxResults"), ("NextToken", "NextToken")]
    );
    assert_eq!(list.headers[0].header, "X-Only-Associated");
    assert!(list.is_bound("OnlyAssociated"));

    // Resource lifecycle operations are imported, Unit output is dropped
    let delete = catalog.operation("DeleteActionTarget").unwrap();
    assert_eq!(delete.method, HttpMethod::Delete);
    assert_eq!(delete.labels(), vec!["ActionTargetArn"]);
    assert!(delete.output.is_none());
}

#[test]
fn test_json_name_overrides_wire_key() {
    let model = r#"{
        "smithy": "2.0",
        "shapes": {
            "ns#Svc": {
                "type": "service",
                "operations": [{ "target": "ns#GetThing" }]
            },
            "ns#GetThing": {
                "type": "operation",
                "input": { "target": "ns#GetThingInput" },
                "traits": { "smithy.api#http": { "method": "GET", "uri": "/things/{thingId}" } }
            },
            "ns#GetThingInput": {
                "type": "structure",
                "members": {
                    "thingId": {
                        "target": "smithy.api#String",
                        "traits": { "smithy.api#httpLabel": {}, "smithy.api#jsonName": "ThingId" }
                    },
                    "kind": {
                        "target": "smithy.api#String",
                        "traits": { "smithy.api#jsonName": "Kind" }
                    }
                }
            }
        }
    }"#;

    let catalog = SmithyParser::from_json(model).unwrap().parse().unwrap();
    let input = catalog.records.get("GetThingInput").unwrap();
    assert!(input.get_field("Kind").is_some());
    assert!(input.get_field("kind").is_none());

    let op = catalog.operation("GetThing").unwrap();
    assert_eq!(op.uri, "/things/{ThingId}");
    assert!(op.input.is_some());
}

#[test]
fn test_missing_service_is_parse_error() {
    let model = r#"{
        "smithy": "2.0",
        "shapes": {
            "ns#Orphan": { "type": "structure", "members": {} }
        }
    }"#;

    let err = SmithyParser::from_json(model).unwrap().parse().unwrap_err();
    assert!(matches!(err, MapperError::Parse(_)));
    assert!(err.to_string().contains("No service shape"));
}

#[test]
fn test_import_from_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(SECURITY_HUB_MODEL.as_bytes()).unwrap();

    let catalog = import_smithy(file.path()).unwrap();
    assert_eq!(catalog.operations.len(), 3);

    // The imported catalog survives a YAML round trip
    let yaml = catalog.to_yaml_string().unwrap();
    let reloaded = findings_mapper_common::SchemaCatalog::from_yaml_str(&yaml).unwrap();
    assert_eq!(reloaded, catalog);
}
