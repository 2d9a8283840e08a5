mod common;

use common::{spawn_server, TestServer, RESET_TOKEN};
use serde_json::{json, Value};

async fn graphql(server: &TestServer, query: &str, variables: Value, token: Option<&str>) -> Value {
    let mut request = server
        .client
        .post(server.url("/graphql"))
        .json(&json!({ "query": query, "variables": variables }));
    if let Some(token) = token {
        request = request.header("x-admin-token", token);
    }
    let response = request.send().await.unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

const CREATE: &str = r#"
    mutation Create($input: PersonneInput!) {
        createPersonne(input: $input) { id nom prenom telephone dateNaissance }
    }
"#;

async fn create(server: &TestServer, input: Value) -> Value {
    graphql(server, CREATE, json!({ "input": input }), None).await
}

#[tokio::test]
async fn create_mutation_normalizes_fields() {
    let server = spawn_server(None).await;

    let body = create(
        &server,
        json!({
            "nom": "dupont",
            "prenom": "MARIE",
            "telephone": "06 12 34 56 78",
            "dateNaissance": "1990-01-01"
        }),
    )
    .await;

    let created = &body["data"]["createPersonne"];
    assert_eq!(created["id"], 1);
    assert_eq!(created["nom"], "DUPONT");
    assert_eq!(created["prenom"], "Marie");
    assert_eq!(created["telephone"], "0612345678");
    assert_eq!(created["dateNaissance"], "1990-01-01");
}

#[tokio::test]
async fn queries_list_fetch_and_search() {
    let server = spawn_server(None).await;
    create(&server, json!({"nom": "dupont", "prenom": "marie"})).await;
    create(&server, json!({"nom": "dupuis", "prenom": "jean", "telephone": "0798765432"})).await;
    create(&server, json!({"nom": "martin", "prenom": "paul"})).await;

    let all = graphql(&server, "{ allPersonnes { id nom } }", json!({}), None).await;
    assert_eq!(all["data"]["allPersonnes"].as_array().unwrap().len(), 3);

    let one = graphql(&server, "{ personne(id: 2) { nom prenom } }", json!({}), None).await;
    assert_eq!(one["data"]["personne"]["nom"], "DUPUIS");
    assert_eq!(one["data"]["personne"]["prenom"], "Jean");

    let search = graphql(
        &server,
        r#"{ searchPersonnes(nom: "Dup") { nom } }"#,
        json!({}),
        None,
    )
    .await;
    let noms: Vec<_> = search["data"]["searchPersonnes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["nom"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(noms, vec!["DUPONT", "DUPUIS"]);

    let by_phone = graphql(
        &server,
        r#"{ searchPersonnes(nom: "dup", telephone: "9876") { nom } }"#,
        json!({}),
        None,
    )
    .await;
    assert_eq!(by_phone["data"]["searchPersonnes"][0]["nom"], "DUPUIS");
    assert_eq!(by_phone["data"]["searchPersonnes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn errors_carry_codes_in_extensions() {
    let server = spawn_server(None).await;
    create(&server, json!({"nom": "dupont", "prenom": "marie", "telephone": "0612345678"})).await;

    let duplicate = create(
        &server,
        json!({"nom": "durand", "prenom": "paul", "telephone": "0612 345 678"}),
    )
    .await;
    assert_eq!(duplicate["errors"][0]["extensions"]["code"], "duplicate_phone");

    let missing = graphql(&server, "{ personne(id: 99) { id } }", json!({}), None).await;
    assert_eq!(missing["errors"][0]["extensions"]["code"], "not_found");

    let too_young = create(
        &server,
        json!({"nom": "bebe", "prenom": "lea", "dateNaissance": chrono::Local::now().date_naive().to_string()}),
    )
    .await;
    assert_eq!(too_young["errors"][0]["extensions"]["code"], "too_young");
}

#[tokio::test]
async fn update_and_delete_mutations() {
    let server = spawn_server(None).await;
    create(&server, json!({"nom": "dupont", "prenom": "marie", "telephone": "0612345678"})).await;

    let updated = graphql(
        &server,
        r#"
        mutation Update($input: PersonneInput!) {
            updatePersonne(id: 1, input: $input) { id nom telephone }
        }
        "#,
        json!({"input": {"nom": "dupont-durand", "prenom": "marie", "telephone": "06 12 34 56 78"}}),
        None,
    )
    .await;
    assert_eq!(updated["data"]["updatePersonne"]["nom"], "DUPONT-DURAND");
    assert_eq!(updated["data"]["updatePersonne"]["telephone"], "0612345678");

    let blank = graphql(
        &server,
        r#"mutation { updatePersonne(id: 1, input: {nom: "", prenom: "marie"}) { id } }"#,
        json!({}),
        None,
    )
    .await;
    assert_eq!(blank["errors"][0]["extensions"]["code"], "invalid_input");

    let deleted = graphql(&server, "mutation { deletePersonne(id: 1) }", json!({}), None).await;
    assert_eq!(deleted["data"]["deletePersonne"], true);

    let again = graphql(&server, "mutation { deletePersonne(id: 1) }", json!({}), None).await;
    assert_eq!(again["errors"][0]["extensions"]["code"], "not_found");
}

#[tokio::test]
async fn reset_table_mutation_is_gated() {
    let server = spawn_server(Some(RESET_TOKEN)).await;
    create(&server, json!({"nom": "dupont", "prenom": "marie"})).await;

    let refused = graphql(&server, "mutation { resetTable }", json!({}), None).await;
    assert_eq!(refused["errors"][0]["extensions"]["code"], "forbidden");

    let accepted = graphql(&server, "mutation { resetTable }", json!({}), Some(RESET_TOKEN)).await;
    assert_eq!(accepted["data"]["resetTable"], true);

    let next = create(&server, json!({"nom": "martin", "prenom": "paul"})).await;
    assert_eq!(next["data"]["createPersonne"]["id"], 1);
}
