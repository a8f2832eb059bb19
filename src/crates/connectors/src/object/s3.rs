//! S3 backend: path-style REST calls signed with SigV4.

use super::sigv4::{self, Credentials, RequestParts};
use super::ObjectSession;
use crate::cache::Connector;
use crate::config::ConnectionConfig;
use crate::error::{ConnectorError, ResourceKind, Result};
use crate::http::{check_status, ClientConfig, HttpClient};
use chrono::Utc;
use reqwest::blocking::{Body, Response};
use reqwest::{Method, StatusCode};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

const KIND: ResourceKind = ResourceKind::ObjectStore;
const DEFAULT_REGION: &str = "us-east-1";

/// Opens S3 clients. No request is made until the first operation.
///
/// Keys: `endpoint` (`host[:port]`), `access_key`, `secret_key`,
/// `secure` (false), `region` (`us-east-1`), `timeout` in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3Connector;

impl Connector for S3Connector {
    type Connection = S3Client;

    fn kind(&self) -> ResourceKind {
        KIND
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<S3Client> {
        S3Client::from_config(config)
    }
}

/// Signed HTTP client for one endpoint.
pub struct S3Client {
    http: HttpClient,
    host: String,
    credentials: Credentials,
}

impl S3Client {
    pub fn from_config(config: &ConnectionConfig) -> Result<Self> {
        let endpoint = config.require("endpoint")?;
        if endpoint.contains("://") || endpoint.contains('/') {
            return Err(ConnectorError::Config(format!(
                "endpoint '{}' must be host[:port] without scheme or path",
                endpoint
            )));
        }
        let secure = config.flag_or("secure", false)?;
        let scheme = if secure { "https" } else { "http" };
        let http = HttpClient::new(
            KIND,
            ClientConfig::new(format!("{}://{}", scheme, endpoint))
                .with_timeout(config.timeout_secs("timeout")?),
        )?;

        Ok(Self {
            http,
            host: host_header(endpoint, secure),
            credentials: Credentials {
                access_key: config.require("access_key")?.to_string(),
                secret_key: config.require("secret_key")?.to_string(),
                region: config.get_or("region", DEFAULT_REGION).to_string(),
            },
        })
    }

    /// Send a signed request with an in-memory body. `path` is unencoded.
    fn send(&self, method: Method, path: &str, query: &[(&str, &str)], body: Vec<u8>) -> Result<Response> {
        let payload_hash = sigv4::sha256_hex(&body);
        let body = if body.is_empty() { None } else { Some(Body::from(body)) };
        self.send_signed(method, path, query, body, &payload_hash)
    }

    /// Send a signed request whose body hash is already known.
    fn send_signed(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Body>,
        payload_hash: &str,
    ) -> Result<Response> {
        let path = sigv4::encode_path(path);
        let signed = sigv4::sign(
            &self.credentials,
            &RequestParts {
                method: method.as_str(),
                host: &self.host,
                path: &path,
                query,
                payload_hash,
            },
            Utc::now(),
        )?;

        let target = if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, sigv4::canonical_query(query))
        };
        let mut request = self
            .http
            .request(method, &target)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256)
            .header("authorization", signed.authorization);
        if let Some(body) = body {
            request = request.body(body);
        }
        self.http.send_raw(request)
    }
}

/// `Host` header value; default ports are omitted.
fn host_header(endpoint: &str, secure: bool) -> String {
    let default_port = if secure { ":443" } else { ":80" };
    endpoint.strip_suffix(default_port).unwrap_or(endpoint).to_string()
}

fn object_path(bucket: &str, name: &str) -> String {
    format!("/{}/{}", bucket, name.trim_start_matches('/'))
}

fn location_constraint(region: &str) -> Vec<u8> {
    if region == DEFAULT_REGION {
        return Vec::new();
    }
    format!(
        "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
         <LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>",
        region
    )
    .into_bytes()
}

/// Stream a response body into `path`. Returns the byte count.
fn write_partial(response: &mut Response, path: &Path) -> Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    let size = response
        .copy_to(&mut writer)
        .map_err(|e| ConnectorError::operation(KIND, e))?;
    writer.flush()?;
    Ok(size)
}

impl ObjectSession for S3Client {
    fn bucket_exists(&mut self, bucket: &str) -> Result<bool> {
        let response = self.send(Method::HEAD, &format!("/{}", bucket), &[], Vec::new())?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            _ => check_status(KIND, response).map(|_| true),
        }
    }

    fn make_bucket(&mut self, bucket: &str) -> Result<()> {
        let body = location_constraint(&self.credentials.region);
        let response = self.send(Method::PUT, &format!("/{}", bucket), &[], body)?;
        check_status(KIND, response)?;
        debug!(bucket, "Bucket created");
        Ok(())
    }

    fn set_bucket_policy(&mut self, bucket: &str, policy: &str) -> Result<()> {
        let response = self.send(
            Method::PUT,
            &format!("/{}", bucket),
            &[("policy", "")],
            policy.as_bytes().to_vec(),
        )?;
        check_status(KIND, response)?;
        Ok(())
    }

    fn put_object(&mut self, bucket: &str, name: &str, source: &Path) -> Result<()> {
        let payload_hash = sigv4::sha256_hex_reader(File::open(source)?)?;
        let file = File::open(source)?;
        let size = file.metadata()?.len();
        let response = self.send_signed(
            Method::PUT,
            &object_path(bucket, name),
            &[],
            Some(Body::sized(file, size)),
            &payload_hash,
        )?;
        check_status(KIND, response)?;
        debug!(bucket, name, size, "Object uploaded");
        Ok(())
    }

    fn get_object(&mut self, bucket: &str, name: &str, target: &Path) -> Result<()> {
        let response = self.send(Method::GET, &object_path(bucket, name), &[], Vec::new())?;
        let mut response = check_status(KIND, response)?;

        let mut partial = target.as_os_str().to_owned();
        partial.push(".part");
        let size = write_partial(&mut response, Path::new(&partial)).map_err(|e| {
            let _ = fs::remove_file(&partial);
            e
        })?;
        fs::rename(&partial, target)?;
        debug!(bucket, name, size, "Object downloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read};
    use std::net::TcpListener;
    use std::thread;

    /// Accept one request, answer 200 with `reply`, return the request head and body.
    fn serve_once(reply: &'static [u8]) -> (String, thread::JoinHandle<(String, Vec<u8>)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line.trim().is_empty() {
                    break;
                }
                head.push_str(&line.to_ascii_lowercase());
            }
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            let mut body = vec![0; length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                reply.len()
            )
            .unwrap();
            stream.write_all(reply).unwrap();
            (head, body)
        });
        (endpoint, handle)
    }

    fn config() -> ConnectionConfig {
        ConnectionConfig::new()
            .with("endpoint", "10.0.0.5:9000")
            .with("access_key", "admin")
            .with("secret_key", "123456")
    }

    #[test]
    fn test_host_header() {
        assert_eq!(host_header("10.0.0.5:9000", false), "10.0.0.5:9000");
        assert_eq!(host_header("minio.local:80", false), "minio.local");
        assert_eq!(host_header("minio.local:80", true), "minio.local:80");
        assert_eq!(host_header("s3.example.com:443", true), "s3.example.com");
    }

    #[test]
    fn test_from_config() {
        let client = S3Client::from_config(&config()).unwrap();
        assert_eq!(client.http.base_url(), "http://10.0.0.5:9000");
        assert_eq!(client.credentials.region, "us-east-1");

        let secure = S3Client::from_config(&config().with("secure", true).with("region", "cn-north-1")).unwrap();
        assert_eq!(secure.http.base_url(), "https://10.0.0.5:9000");
        assert_eq!(secure.credentials.region, "cn-north-1");
    }

    #[test]
    fn test_from_config_rejects_bad_endpoint() {
        assert!(S3Client::from_config(&config().with("endpoint", "http://10.0.0.5:9000")).is_err());
        assert!(S3Client::from_config(&config().with("secret_key", "")).is_err());
    }

    #[test]
    fn test_location_constraint() {
        assert!(location_constraint("us-east-1").is_empty());
        let body = String::from_utf8(location_constraint("eu-west-1")).unwrap();
        assert!(body.contains("<LocationConstraint>eu-west-1</LocationConstraint>"));
    }

    #[test]
    fn test_put_object_streams_file_with_its_hash() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("report.csv");
        let content = "id,value\n".repeat(5_000);
        fs::write(&source, &content).unwrap();

        let (endpoint, server) = serve_once(b"");
        let mut client = S3Client::from_config(&config().with("endpoint", endpoint)).unwrap();
        client.put_object("docs", "2024/report.csv", &source).unwrap();

        let (head, body) = server.join().unwrap();
        assert!(head.starts_with("put /docs/2024/report.csv "));
        assert!(head.contains(&format!("x-amz-content-sha256: {}", sigv4::sha256_hex(content.as_bytes()))));
        assert_eq!(body, content.as_bytes());
    }

    #[test]
    fn test_get_object_writes_target_without_leftovers() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("report.csv");

        let (endpoint, server) = serve_once(b"id,value\n1,2\n");
        let mut client = S3Client::from_config(&config().with("endpoint", endpoint)).unwrap();
        client.get_object("docs", "report.csv", &target).unwrap();
        server.join().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "id,value\n1,2\n");
        assert!(!tmp.path().join("report.csv.part").exists());
    }

    #[test]
    fn test_object_path() {
        assert_eq!(object_path("docs", "/2024/report.pdf"), "/docs/2024/report.pdf");
    }
}
