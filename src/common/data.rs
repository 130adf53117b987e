use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// One logical header, cookie or query string parameter name bound to a
/// single value or to a list of values.
///
/// The control plane distinguishes the two shapes on the wire: a name with
/// one value serializes as `{"name": ..., "value": ...}`, a name with two or
/// more values serializes as `{"name": ..., "values": [...]}`. At most one
/// of the two fields is ever populated. Once an entry has switched to the
/// multi-value shape it never switches back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NameValue {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl NameValue {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            values: None,
        }
    }

    /// Adds another value to this entry, switching from the single-value to
    /// the multi-value shape on the second addition. Duplicate values are
    /// kept as-is, mirroring repeated-header semantics.
    pub fn add_value<V: Into<String>>(&mut self, new_value: V) {
        let new_value = new_value.into();
        if let Some(existing) = self.value.take() {
            self.values = Some(vec![existing, new_value]);
        } else if let Some(values) = self.values.as_mut() {
            values.push(new_value);
        } else {
            self.value = Some(new_value);
        }
    }
}

/// Merges a value into an ordered name/value collection. Names are compared
/// case-sensitively; a known name is extended in place, an unknown name is
/// appended, so the collection keeps the first-seen order of distinct names.
fn add_name_value<N: Into<String>, V: Into<String>>(
    entries: &mut Vec<NameValue>,
    name: N,
    value: V,
) {
    let name = name.into();
    if let Some(entry) = entries.iter_mut().find(|e| e.name == name) {
        entry.add_value(value);
        return;
    }
    entries.push(NameValue::new(name, value));
}

/// The body part of a [`RequestMatcher`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(rename = "type")]
    pub body_type: BodyType,
    pub value: String,
    /// Match strictness selector, only meaningful for JSON bodies. The value
    /// is passed through to the remote service verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum BodyType {
    String,
    Json,
}

/// A response delay, e.g. `Delay { time_unit: "SECONDS", value: 2.0 }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Delay {
    pub time_unit: String,
    pub value: f64,
}

/// How often an expectation may still match before it expires.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Times {
    pub remaining_times: usize,
    pub unlimited: bool,
}

/// How long an expectation stays registered.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeToLive {
    pub time_unit: String,
    pub time_to_live: f64,
    pub unlimited: bool,
}

/// Represents an HTTP method.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "CONNECT" => Ok(Method::CONNECT),
            "OPTIONS" => Ok(Method::OPTIONS),
            "TRACE" => Ok(Method::TRACE),
            "PATCH" => Ok(Method::PATCH),
            _ => Err(format!("Invalid HTTP method {}", input)),
        }
    }
}

impl From<&str> for Method {
    fn from(value: &str) -> Self {
        value.parse().unwrap_or_else(|err| panic!("{}", err))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A partial description of an HTTP request. It is used both to register
/// expectations (the request side of [`Expectation`]) and as the filter of
/// [`Verify`] and [`Retrieve`] queries.
///
/// Builder methods consume and return the matcher so calls can be chained:
///
/// ```
/// use mockserver_client::{Method, RequestMatcher};
///
/// let matcher = RequestMatcher::new(Method::GET, "/search")
///     .query_param("query", "metallica")
///     .header("Accept", "application/json");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestMatcher {
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_string_parameters: Vec<NameValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<NameValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<NameValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl RequestMatcher {
    /// Creates a matcher for the given method and path. The method accepts
    /// both [`Method`] values and plain strings like `"GET"`.
    pub fn new<M: Into<Method>, P: Into<String>>(method: M, path: P) -> Self {
        Self {
            method: method.into().to_string(),
            path: path.into(),
            query_string_parameters: Vec::new(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: None,
        }
    }

    /// Requires the given query string parameter. Calling this again with
    /// the same name merges the values into one multi-valued parameter.
    pub fn query_param<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        add_name_value(&mut self.query_string_parameters, name, value);
        self
    }

    /// Requires the given header. Calling this again with the same name
    /// merges the values into one multi-valued header.
    pub fn header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        add_name_value(&mut self.headers, name, value);
        self
    }

    /// Requires the given cookie. Calling this again with the same name
    /// merges the values into one multi-valued cookie.
    pub fn cookie<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        add_name_value(&mut self.cookies, name, value);
        self
    }

    /// Requires the request body to equal the given string. Replaces any
    /// previously set body.
    pub fn string_body<B: Into<String>>(mut self, body: B) -> Self {
        self.body = Some(Body {
            body_type: BodyType::String,
            value: body.into(),
            match_type: None,
        });
        self
    }

    /// Requires the request body to match the given JSON document. Replaces
    /// any previously set body.
    pub fn json_body<B: Into<String>>(mut self, json_body: B) -> Self {
        self.body = Some(Body {
            body_type: BodyType::Json,
            value: json_body.into(),
            match_type: None,
        });
        self
    }

    /// Like [`RequestMatcher::json_body`], but additionally selects the JSON
    /// match strictness understood by the remote service (e.g. `"STRICT"`).
    pub fn json_body_with_match_type<T: Into<String>, B: Into<String>>(
        mut self,
        match_type: T,
        json_body: B,
    ) -> Self {
        self.body = Some(Body {
            body_type: BodyType::Json,
            value: json_body.into(),
            match_type: Some(match_type.into()),
        });
        self
    }
}

/// The canned response served by the mock server when an expectation
/// matches.
///
/// ```
/// use mockserver_client::ResponseTemplate;
///
/// let response = ResponseTemplate::new(200)
///     .header("Content-Type", "text/html")
///     .body("ohi")
///     .delay("SECONDS", 1.0);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTemplate {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<NameValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<NameValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
}

impl ResponseTemplate {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            cookies: Vec::new(),
            body: None,
            delay: None,
        }
    }

    /// Adds a response header. Repeated names merge into one multi-valued
    /// header.
    pub fn header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        add_name_value(&mut self.headers, name, value);
        self
    }

    /// Adds a response cookie. Repeated names merge into one multi-valued
    /// cookie.
    pub fn cookie<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        add_name_value(&mut self.cookies, name, value);
        self
    }

    /// Sets the response body. Replaces any previously set body.
    pub fn body<B: Into<String>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Delays the response by the given amount, e.g. `delay("SECONDS", 2.0)`.
    pub fn delay<U: Into<String>>(mut self, time_unit: U, value: f64) -> Self {
        self.delay = Some(Delay {
            time_unit: time_unit.into(),
            value,
        });
        self
    }
}

/// Pairs a [`RequestMatcher`] with a [`ResponseTemplate`] and registers how
/// long and how often the pairing applies.
///
/// ```
/// use mockserver_client::{Expectation, Method, RequestMatcher, ResponseTemplate};
///
/// let expectation = Expectation::new()
///     .when(RequestMatcher::new(Method::GET, "/test"))
///     .respond(ResponseTemplate::new(200))
///     .times(3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    pub http_request: Option<RequestMatcher>,
    pub http_response: Option<ResponseTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub times: Option<Times>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<TimeToLive>,
}

impl Expectation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request matcher this expectation responds to.
    pub fn when(mut self, request: RequestMatcher) -> Self {
        self.http_request = Some(request);
        self
    }

    /// Sets the response the mock server serves on a match.
    pub fn respond(mut self, response: ResponseTemplate) -> Self {
        self.http_response = Some(response);
        self
    }

    /// Limits the expectation to the given number of matches. Omitting this
    /// call leaves the service default, which is unlimited.
    pub fn times(mut self, remaining_times: usize) -> Self {
        self.times = Some(Times {
            remaining_times,
            unlimited: false,
        });
        self
    }

    /// Expires the expectation after the given duration. Omitting this call
    /// leaves the service default, which is unlimited.
    pub fn time_to_live<U: Into<String>>(mut self, time_unit: U, time_to_live: f64) -> Self {
        self.time_to_live = Some(TimeToLive {
            time_unit: time_unit.into(),
            time_to_live,
            unlimited: false,
        });
        self
    }
}

/// The times-constraint of a [`Verify`] query: `exact` demands exactly
/// `count` matching requests, otherwise at least `count` are required.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifyTimes {
    pub count: usize,
    pub exact: bool,
}

/// Asserts that the proxy observed requests matching a [`RequestMatcher`]
/// a certain number of times.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verify {
    pub http_request: Option<RequestMatcher>,
    pub times: Option<VerifyTimes>,
}

impl Verify {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request filter to verify against.
    pub fn match_request(mut self, request: RequestMatcher) -> Self {
        self.http_request = Some(request);
        self
    }

    /// Sets the required match count. `exact` selects exact-count versus
    /// at-least semantics.
    pub fn times(mut self, count: usize, exact: bool) -> Self {
        self.times = Some(VerifyTimes { count, exact });
        self
    }
}

/// Fetches the requests recorded by the proxy that match a filter. Without
/// a filter, all recorded requests are returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieve {
    pub http_request: Option<RequestMatcher>,
}

impl Retrieve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request filter to retrieve by.
    pub fn match_request(mut self, request: RequestMatcher) -> Self {
        self.http_request = Some(request);
        self
    }
}

/// A read-only record of one request previously observed by the proxy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordedRequest {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub headers: Vec<NameValue>,
    #[serde(default)]
    pub keep_alive: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_base64")]
    pub body: Option<Vec<u8>>,
}

/// Serializes and deserializes the recorded body to/from a Base64 string.
mod opt_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(value) => serializer.serialize_str(&STANDARD.encode(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        value
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
