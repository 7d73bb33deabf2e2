//! Release notes templates.

pub const MARKDOWN_TEMPLATE_NAME: &str = "changelog.md";
pub const HTML_TEMPLATE_NAME: &str = "release-notes.html";

pub const MARKDOWN_TEMPLATE: &str = r#"# {{ version }}

{% if downloads -%}
## Downloads for {{ version }}

| filename | sha512 hash |
| -------- | ----------- |
{% for d in downloads -%}
| [{{ d.name }}]({{ d.url }}) | `{{ d.sha512 }}` |
{% endfor %}
{% endif -%}
## Changelog since {{ previous_tag | default(value="the beginning of history") }}

{% for section in sections -%}
### {{ section.title }}

{% for commit in section.commits -%}
- {% if commit.breaking %}[**breaking**] {% endif %}{% if commit.scope %}_({{ commit.scope }})_ {% endif %}{{ commit.title }} ({{ commit.short_id }})
{% endfor %}
{% endfor -%}
{% if not sections -%}
No changes.

{% endif -%}
{% if dependencies -%}
## Dependencies

{% if dependencies.added -%}
### Added
{% for dep in dependencies.added -%}
- {{ dep.name }}: {{ dep.version }}
{% endfor %}
{% endif -%}
{% if dependencies.changed -%}
### Changed
{% for dep in dependencies.changed -%}
- {{ dep.name }}: {{ dep.from }} → {{ dep.to }}
{% endfor %}
{% endif -%}
{% if dependencies.removed -%}
### Removed
{% for dep in dependencies.removed -%}
- {{ dep.name }}: {{ dep.version }}
{% endfor %}
{% endif -%}
{% if not dependencies.added and not dependencies.changed and not dependencies.removed -%}
No dependency changes.
{% endif -%}
{% endif -%}
"#;

pub const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ product }} {{ version }}</title>
</head>
<body>
<h1>{{ product }} {{ version }}</h1>
<p>Branch {{ branch }}, generated {{ date }}.</p>
{% if downloads %}
<h2>Downloads</h2>
<table>
<tr><th>filename</th><th>sha512 hash</th></tr>
{% for d in downloads %}<tr><td><a href="{{ d.url }}">{{ d.name }}</a></td><td><code>{{ d.sha512 }}</code></td></tr>
{% endfor %}</table>
{% endif %}
<h2>Changelog since {{ previous_tag | default(value="the beginning of history") }}</h2>
{% for section in sections %}
<h3>{{ section.title }}</h3>
<ul>
{% for commit in section.commits %}<li>{% if commit.breaking %}<strong>breaking</strong> {% endif %}{% if commit.scope %}<em>({{ commit.scope }})</em> {% endif %}{{ commit.title }} ({{ commit.short_id }})</li>
{% endfor %}</ul>
{% endfor %}
{% if dependencies %}
<h2>Dependencies</h2>
<ul>
{% for dep in dependencies.added %}<li>added {{ dep.name }} {{ dep.version }}</li>
{% endfor %}{% for dep in dependencies.changed %}<li>changed {{ dep.name }} {{ dep.from }} to {{ dep.to }}</li>
{% endfor %}{% for dep in dependencies.removed %}<li>removed {{ dep.name }} {{ dep.version }}</li>
{% endfor %}</ul>
{% endif %}
</body>
</html>
"#;
