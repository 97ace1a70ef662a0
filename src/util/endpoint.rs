/// Joins `{api_url}/{bucket}/{name}`. `name` is not escaped.
pub fn endpoint(api_url: &str, bucket: &str, name: &str) -> String {
    format!("{}/{}/{}", api_url, bucket, name)
}
