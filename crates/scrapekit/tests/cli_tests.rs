use assert_cmd::Command;
use httpmock::{Method::GET, MockServer};
use rstest::rstest;

const PAGE: &str = r#"<html><head><title>Forecast</title></head>
<body><h1>Today</h1><a href="/north">North</a><a href="/south">South</a></body></html>"#;

fn scrapekit() -> Command {
    let mut cmd = Command::cargo_bin("scrapekit").unwrap();
    cmd.env("RUST_LOG", "off")
        .env("SCRAPEKIT_RETRY_COUNT", "0")
        .env("SCRAPEKIT_RETRY_DELAY", "0");
    cmd
}

#[rstest]
#[case(&["--select", "h1"], "Today\n")]
#[case(&["--select", "a", "--attr", "href"], "/north\n/south\n")]
fn test_cli_extracts_html(#[case] args: &[&str], #[case] expected: &str) {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/page");
        then.status(200).body(PAGE);
    });

    scrapekit()
        .arg(server.url("/page"))
        .arg("--ignore-robots")
        .args(args)
        .assert()
        .success()
        .stdout(expected.to_string());
}

#[test]
fn test_cli_pretty_prints_json_with_params() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api")
            .query_param("city", "sg")
            .header("accept", "application/json");
        then.status(200).body(r#"{"temperature":31}"#);
    });

    scrapekit()
        .arg(server.url("/api"))
        .args(["--parser", "json", "--ignore-robots"])
        .args(["-q", "city=sg", "-H", "Accept: application/json"])
        .assert()
        .success()
        .stdout("{\n  \"temperature\": 31\n}\n");
    mock.assert();
}

#[test]
fn test_cli_respects_robots_by_default() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/robots.txt");
        then.status(200).body("User-agent: *\nDisallow: /\n");
    });
    let page = server.mock(|when, then| {
        when.method(GET).path("/page");
        then.status(200).body(PAGE);
    });

    scrapekit()
        .arg(server.url("/page"))
        .assert()
        .failure()
        .stdout("");
    page.assert_calls(0);
}

#[test]
fn test_cli_reports_http_failure() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/broken");
        then.status(500);
    });

    scrapekit()
        .arg(server.url("/broken"))
        .args(["--ignore-robots", "--retries", "1", "--retry-delay", "0"])
        .assert()
        .failure();
    mock.assert_calls(2);
}

#[test]
fn test_cli_rejects_unknown_parser() {
    scrapekit()
        .args(["http://127.0.0.1:9/", "--parser", "yaml"])
        .assert()
        .failure();
}
