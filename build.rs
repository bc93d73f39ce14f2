use std::path::PathBuf;

const SCALAR_MIN_JS: &str = "https://cdn.jsdelivr.net/npm/@scalar/api-reference";

fn default_theme() -> String {
	"default".into()
}

fn default_spec_url() -> String {
	"/docs/private/api.json".into()
}

#[derive(serde::Deserialize)]
struct Manifest {
	package: Package,
}

#[derive(serde::Deserialize)]
struct Package {
	metadata: Metadata,
}

#[derive(serde::Deserialize)]
struct Metadata {
	scalar: Scalar,
}

#[derive(serde::Deserialize)]
struct Scalar {
	#[serde(default = "default_theme")]
	theme: String,
	#[serde(default = "default_spec_url")]
	spec_url: String,
	title: String,
}

/// Inlines the Scalar bundle, or links to it when it cannot be downloaded
/// (for example in offline builds).
fn script() -> String {
	match ureq::get(SCALAR_MIN_JS).call().map(ureq::Response::into_string) {
		Ok(Ok(js)) => format!("<script>{js}</script>"),
		_ => {
			println!("cargo:warning=could not download {SCALAR_MIN_JS}, linking to it instead");
			format!(r#"<script src="{SCALAR_MIN_JS}"></script>"#)
		}
	}
}

// Renders the API reference page from `[package.metadata.scalar]`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
	println!("cargo:rerun-if-changed=Cargo.toml");

	let manifest = std::fs::read_to_string("Cargo.toml")?;
	let scalar = toml::from_str::<Manifest>(&manifest)?.package.metadata.scalar;

	let out = PathBuf::from(std::env::var("OUT_DIR")?);
	let script = script();

	let html = format!(
		r#"<!DOCTYPE html>
		<html>
			<head>
				<title>{title}</title>
				<meta charset="utf-8" />
				<meta
					name="viewport"
					content="width=device-width, initial-scale=1" />
				<style>
					body {{
						margin: 0;
					}}
				</style>
			</head>
			<body>
				<script
					id="api-reference"></script>
				<script>
					var configuration = {{
						theme: '{theme}',
						spec: {{
							url: '{spec_url}'
						}}
					}}

					var apiReference = document.getElementById('api-reference')
					apiReference.dataset.configuration = JSON.stringify(configuration)
				</script>
				{script}
			</body>
		</html>"#,
		title = scalar.title,
		theme = scalar.theme,
		spec_url = scalar.spec_url,
	);

	std::fs::write(out.join("scalar.html"), html)?;

	Ok(())
}
