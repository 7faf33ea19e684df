//! Spring Boot project scaffold
//!
//! Generated files with no source counterpart: the application entry point,
//! the Maven manifest, `application.yml`, and a security configuration when
//! the analysed handlers show authentication or authorization logic.

use crate::analysis::ProjectInsights;
use crate::config::ScaffoldConfig;
use crate::error::Result;
use crate::types::ScaffoldArtifact;
use serde::Serialize;
use std::collections::BTreeMap;

pub struct ScaffoldGenerator<'a> {
    config: &'a ScaffoldConfig,
}

impl<'a> ScaffoldGenerator<'a> {
    pub fn new(config: &'a ScaffoldConfig) -> Self {
        Self { config }
    }

    /// Artifacts to generate, in plan order
    pub fn artifacts(&self, insights: &ProjectInsights) -> Vec<ScaffoldArtifact> {
        let mut artifacts = vec![
            ScaffoldArtifact::EntryPoint,
            ScaffoldArtifact::Manifest,
            ScaffoldArtifact::RuntimeConfig,
        ];
        if insights.needs_security {
            artifacts.push(ScaffoldArtifact::SecurityConfig);
        }
        artifacts
    }

    /// Target path relative to the target root
    pub fn target_path(&self, artifact: ScaffoldArtifact) -> String {
        let package_dir = self.config.package_dir();
        match artifact {
            ScaffoldArtifact::EntryPoint => format!(
                "src/main/java/{}/{}.java",
                package_dir, self.config.main_class
            ),
            ScaffoldArtifact::Manifest => "pom.xml".to_string(),
            ScaffoldArtifact::RuntimeConfig => "src/main/resources/application.yml".to_string(),
            ScaffoldArtifact::SecurityConfig => {
                format!("src/main/java/{}/config/SecurityConfig.java", package_dir)
            }
        }
    }

    pub fn render(&self, artifact: ScaffoldArtifact, insights: &ProjectInsights) -> Result<String> {
        Ok(match artifact {
            ScaffoldArtifact::EntryPoint => self.entry_point(),
            ScaffoldArtifact::Manifest => self.manifest(insights.needs_security),
            ScaffoldArtifact::RuntimeConfig => self.runtime_config(insights.needs_security)?,
            ScaffoldArtifact::SecurityConfig => self.security_config(),
        })
    }

    fn entry_point(&self) -> String {
        format!(
            r#"package {package};

import org.springframework.boot.SpringApplication;
import org.springframework.boot.autoconfigure.SpringBootApplication;

@SpringBootApplication
public class {class} {{
    public static void main(String[] args) {{
        SpringApplication.run({class}.class, args);
    }}
}}
"#,
            package = self.config.base_package,
            class = self.config.main_class
        )
    }

    fn manifest(&self, with_security: bool) -> String {
        let c = self.config;
        let mut deps = String::new();
        for starter in ["web", "thymeleaf", "data-jpa", "validation"] {
            deps.push_str(&dependency("org.springframework.boot", &format!("spring-boot-starter-{}", starter), None));
        }
        if with_security {
            deps.push_str(&dependency("org.springframework.boot", "spring-boot-starter-security", None));
        }
        deps.push_str(&dependency("com.h2database", "h2", Some("runtime")));
        deps.push_str(&dependency("org.postgresql", "postgresql", Some("runtime")));
        deps.push_str(
            "        <dependency>\n            <groupId>org.springframework.boot</groupId>\n            <artifactId>spring-boot-devtools</artifactId>\n            <scope>runtime</scope>\n            <optional>true</optional>\n        </dependency>\n",
        );
        deps.push_str(&dependency("org.springframework.boot", "spring-boot-starter-test", Some("test")));

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
    <modelVersion>4.0.0</modelVersion>

    <parent>
        <groupId>org.springframework.boot</groupId>
        <artifactId>spring-boot-starter-parent</artifactId>
        <version>{boot}</version>
        <relativePath/>
    </parent>

    <groupId>{group}</groupId>
    <artifactId>{artifact}</artifactId>
    <version>{version}</version>
    <packaging>jar</packaging>

    <name>{artifact}</name>
    <description>Converted JSP application to Spring Boot</description>

    <properties>
        <java.version>{java}</java.version>
    </properties>

    <dependencies>
{deps}    </dependencies>

    <build>
        <plugins>
            <plugin>
                <groupId>org.springframework.boot</groupId>
                <artifactId>spring-boot-maven-plugin</artifactId>
            </plugin>
        </plugins>
    </build>
</project>
"#,
            boot = c.spring_boot_version,
            group = c.group_id,
            artifact = c.artifact_id,
            version = c.version,
            java = c.java_version,
            deps = deps
        )
    }

    fn runtime_config(&self, with_security: bool) -> Result<String> {
        let c = self.config;
        let mut level = BTreeMap::new();
        level.insert(c.base_package.clone(), c.log_level.clone());
        level.insert("org.springframework.web".to_string(), "DEBUG".to_string());

        let document = ApplicationYml {
            server: Server {
                port: c.server_port,
                servlet: ServletSettings {
                    context_path: c.context_path.clone(),
                },
            },
            spring: Spring {
                application: Application {
                    name: c.artifact_id.clone(),
                },
                datasource: Datasource {
                    url: c.database_url.clone(),
                    username: c.database_username.clone(),
                    password: c.database_password.clone(),
                    driver_class_name: c.database_driver.clone(),
                },
                jpa: Jpa {
                    hibernate: Hibernate {
                        ddl_auto: "create-drop".to_string(),
                    },
                    show_sql: true,
                    database_platform: "org.hibernate.dialect.H2Dialect".to_string(),
                },
                thymeleaf: Thymeleaf {
                    cache: false,
                    prefix: "classpath:/templates/".to_string(),
                    suffix: ".html".to_string(),
                },
                security: with_security.then(|| Security {
                    user: SecurityUser {
                        name: "admin".to_string(),
                        password: "admin".to_string(),
                        roles: vec!["ADMIN".to_string()],
                    },
                }),
            },
            logging: Logging { level },
        };
        Ok(serde_yaml::to_string(&document)?)
    }

    fn security_config(&self) -> String {
        format!(
            r#"package {package}.config;

import org.springframework.context.annotation.Bean;
import org.springframework.context.annotation.Configuration;
import org.springframework.security.config.annotation.web.builders.HttpSecurity;
import org.springframework.security.config.annotation.web.configuration.EnableWebSecurity;
import org.springframework.security.core.userdetails.User;
import org.springframework.security.core.userdetails.UserDetails;
import org.springframework.security.core.userdetails.UserDetailsService;
import org.springframework.security.crypto.bcrypt.BCryptPasswordEncoder;
import org.springframework.security.crypto.password.PasswordEncoder;
import org.springframework.security.provisioning.InMemoryUserDetailsManager;
import org.springframework.security.web.SecurityFilterChain;

@Configuration
@EnableWebSecurity
public class SecurityConfig {{

    @Bean
    public SecurityFilterChain filterChain(HttpSecurity http) throws Exception {{
        http
            .authorizeHttpRequests(authz -> authz
                .requestMatchers("/", "/home", "/css/**", "/js/**").permitAll()
                .anyRequest().authenticated()
            )
            .formLogin(form -> form
                .loginPage("/login")
                .permitAll()
            )
            .logout(logout -> logout.permitAll());

        return http.build();
    }}

    @Bean
    public UserDetailsService userDetailsService() {{
        UserDetails user = User.builder()
            .username("admin")
            .password(passwordEncoder().encode("admin"))
            .roles("ADMIN")
            .build();

        return new InMemoryUserDetailsManager(user);
    }}

    @Bean
    public PasswordEncoder passwordEncoder() {{
        return new BCryptPasswordEncoder();
    }}
}}
"#,
            package = self.config.base_package
        )
    }
}

fn dependency(group: &str, artifact: &str, scope: Option<&str>) -> String {
    let scope = scope
        .map(|s| format!("            <scope>{}</scope>\n", s))
        .unwrap_or_default();
    format!(
        "        <dependency>\n            <groupId>{}</groupId>\n            <artifactId>{}</artifactId>\n{}        </dependency>\n",
        group, artifact, scope
    )
}

// application.yml document shape

#[derive(Serialize)]
struct ApplicationYml {
    server: Server,
    spring: Spring,
    logging: Logging,
}

#[derive(Serialize)]
struct Server {
    port: u16,
    servlet: ServletSettings,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct ServletSettings {
    context_path: String,
}

#[derive(Serialize)]
struct Spring {
    application: Application,
    datasource: Datasource,
    jpa: Jpa,
    thymeleaf: Thymeleaf,
    #[serde(skip_serializing_if = "Option::is_none")]
    security: Option<Security>,
}

#[derive(Serialize)]
struct Application {
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Datasource {
    url: String,
    username: String,
    password: String,
    driver_class_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Jpa {
    hibernate: Hibernate,
    show_sql: bool,
    database_platform: String,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Hibernate {
    ddl_auto: String,
}

#[derive(Serialize)]
struct Thymeleaf {
    cache: bool,
    prefix: String,
    suffix: String,
}

#[derive(Serialize)]
struct Security {
    user: SecurityUser,
}

#[derive(Serialize)]
struct SecurityUser {
    name: String,
    password: String,
    roles: Vec<String>,
}

#[derive(Serialize)]
struct Logging {
    level: BTreeMap<String, String>,
}
