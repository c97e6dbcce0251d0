use tracing_subscriber::EnvFilter;
use urlrewrite::{Request, RuleSet};

const RULES: &str = r#"<rewrite>
  <rules>
    <rule name="Block admin" stopProcessing="true">
      <match url="^/admin" />
      <conditions>
        <add input="{REMOTE_ADDR}" pattern="^10\." negate="true" />
      </conditions>
      <action type="CustomResponse" statusCode="403" statusReason="Forbidden" />
    </rule>
    <rule name="Sign in" stopProcessing="true">
      <match url="^/signin$" />
      <action type="Redirect" url="/login" redirectType="Found" />
    </rule>
    <rule name="Products">
      <match url="^/products/(\d+)/?$" />
      <action type="Rewrite" url="/product.aspx?id={R:1}" logRewrittenUrl="true" />
    </rule>
  </rules>
</rewrite>"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let rules = RuleSet::from_xml(RULES).expect("failed to load rules");
    println!("{rules}");

    for (path, query) in [
        ("/products/42", "ref=home"),
        ("/signin", ""),
        ("/admin/users", ""),
        ("/about", ""),
    ] {
        let request = Request::new(path)
            .query(query)
            .remote_addr("203.0.113.9:5000".parse().expect("valid address"));
        println!("{path}?{query} -> {}", rules.evaluate_request(&request));
    }

    let report = rules.evaluate_detailed(&Request::new("/products/7"));
    println!("{report}");
}
