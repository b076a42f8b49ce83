//! OAI-PMH 2.0 XML rendering
//!
//! Every response is an `OAI-PMH` document holding `responseDate`, the
//! `request` echo and either the verb element or one `error` element.

use chrono::{DateTime, SecondsFormat, Utc};
use oaipmh_core::{
    DublinCore, Header, Identity, MetadataFormat, OaiError, OaiResponse, Page, Payload,
    RecordView, Resumption,
};
use oaipmh_db::RecordSet;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

pub const OAI_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/";
pub const OAI_SCHEMA_LOCATION: &str =
    "http://www.openarchives.org/OAI/2.0/ http://www.openarchives.org/OAI/2.0/OAI-PMH.xsd";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// Content type of every `/oai` response
pub const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

type Result<T> = std::result::Result<T, RenderError>;

/// Render a complete OAI-PMH document
pub fn render(
    response: &OaiResponse,
    base_url: &str,
    response_date: DateTime<Utc>,
) -> Result<String> {
    let mut xml = OaiWriter::new();
    xml.declaration()?;
    xml.start(
        "OAI-PMH",
        &[
            ("xmlns", OAI_NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", OAI_SCHEMA_LOCATION),
        ],
    )?;
    xml.text_element("responseDate", &format_utc(&response_date))?;
    write_request(&mut xml, response, base_url)?;

    match &response.result {
        Ok(payload) => write_payload(&mut xml, payload)?,
        Err(error) => write_error(&mut xml, error)?,
    }

    xml.end("OAI-PMH")?;
    xml.finish()
}

fn write_request(xml: &mut OaiWriter, response: &OaiResponse, base_url: &str) -> Result<()> {
    let mut attributes = Vec::new();
    if response.echoes_arguments()
        && let Some(request) = &response.request
    {
        attributes.push(("verb", request.verb().as_str()));
        attributes.extend(request.iter());
    }
    xml.start("request", &attributes)?;
    xml.text(base_url)?;
    xml.end("request")
}

fn write_error(xml: &mut OaiWriter, error: &OaiError) -> Result<()> {
    xml.start("error", &[("code", error.code().as_str())])?;
    xml.text(&error.to_string())?;
    xml.end("error")
}

fn write_payload(xml: &mut OaiWriter, payload: &Payload) -> Result<()> {
    let verb = payload.verb().as_str();
    xml.start(verb, &[])?;
    match payload {
        Payload::Identify(identity) => write_identity(xml, identity)?,
        Payload::GetRecord(view) => write_record(xml, view)?,
        Payload::ListIdentifiers(page) => write_page(xml, page, write_header)?,
        Payload::ListRecords(page) => write_page(xml, page, write_record)?,
        Payload::ListMetadataFormats(formats) => {
            for format in formats {
                write_metadata_format(xml, format)?;
            }
        }
        Payload::ListSets(page) => write_page(xml, page, write_set)?,
    }
    xml.end(verb)
}

fn write_identity(xml: &mut OaiWriter, identity: &Identity) -> Result<()> {
    xml.text_element("repositoryName", &identity.repository_name)?;
    xml.text_element("baseURL", &identity.base_url)?;
    xml.text_element("protocolVersion", identity.protocol_version)?;
    xml.text_element("adminEmail", &identity.admin_email)?;
    xml.text_element("earliestDatestamp", &identity.earliest_datestamp)?;
    xml.text_element("deletedRecord", identity.deleted_record)?;
    xml.text_element("granularity", identity.granularity.oai_pattern())
}

fn write_page<T>(
    xml: &mut OaiWriter,
    page: &Page<T>,
    write_item: fn(&mut OaiWriter, &T) -> Result<()>,
) -> Result<()> {
    for item in &page.items {
        write_item(xml, item)?;
    }
    if let Some(resumption) = &page.resumption {
        write_resumption(xml, resumption)?;
    }
    Ok(())
}

fn write_resumption(xml: &mut OaiWriter, resumption: &Resumption) -> Result<()> {
    let cursor = resumption.cursor.to_string();
    let size = resumption.complete_list_size.to_string();
    let expiration = resumption.expiration_date.as_ref().map(format_utc);

    let mut attributes = Vec::with_capacity(3);
    if let Some(expiration) = &expiration {
        attributes.push(("expirationDate", expiration.as_str()));
    }
    attributes.push(("completeListSize", size.as_str()));
    attributes.push(("cursor", cursor.as_str()));

    match &resumption.token {
        Some(token) => {
            xml.start("resumptionToken", &attributes)?;
            xml.text(token)?;
            xml.end("resumptionToken")
        }
        None => xml.empty("resumptionToken", &attributes),
    }
}

fn write_header(xml: &mut OaiWriter, header: &Header) -> Result<()> {
    xml.start("header", &[])?;
    xml.text_element("identifier", &header.identifier)?;
    xml.text_element("datestamp", &header.datestamp)?;
    for spec in &header.set_specs {
        xml.text_element("setSpec", spec)?;
    }
    xml.end("header")
}

fn write_record(xml: &mut OaiWriter, view: &RecordView) -> Result<()> {
    xml.start("record", &[])?;
    write_header(xml, &view.header)?;
    xml.start("metadata", &[])?;
    write_dublin_core(xml, &view.metadata)?;
    xml.end("metadata")?;
    xml.end("record")
}

fn write_dublin_core(xml: &mut OaiWriter, dc: &DublinCore) -> Result<()> {
    let format = MetadataFormat::OaiDc;
    let schema_location = format!("{} {}", format.namespace(), format.schema());
    xml.start(
        "oai_dc:dc",
        &[
            ("xmlns:oai_dc", format.namespace()),
            ("xmlns:dc", DC_NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", schema_location.as_str()),
        ],
    )?;
    for (element, value) in dc.iter() {
        xml.text_element(&element.qualified_name(), value)?;
    }
    xml.end("oai_dc:dc")
}

fn write_metadata_format(xml: &mut OaiWriter, format: &MetadataFormat) -> Result<()> {
    xml.start("metadataFormat", &[])?;
    xml.text_element("metadataPrefix", format.prefix())?;
    xml.text_element("schema", format.schema())?;
    xml.text_element("metadataNamespace", format.namespace())?;
    xml.end("metadataFormat")
}

fn write_set(xml: &mut OaiWriter, set: &RecordSet) -> Result<()> {
    xml.start("set", &[])?;
    xml.text_element("setSpec", &set.spec)?;
    xml.text_element("setName", &set.name)?;
    if let Some(description) = &set.description {
        xml.start("setDescription", &[])?;
        write_dublin_core(
            xml,
            &DublinCore::new().with(oaipmh_core::DcElement::Description, description.as_str()),
        )?;
        xml.end("setDescription")?;
    }
    xml.end("set")
}

fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Thin event helper over the quick-xml writer
struct OaiWriter {
    writer: Writer<Vec<u8>>,
}

impl OaiWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn declaration(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(())
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name, &[])?;
        self.text(text)?;
        self.end(name)
    }

    fn finish(self) -> Result<String> {
        Ok(String::from_utf8(self.writer.into_inner())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use oaipmh_core::{DcElement, Granularity, QueryArguments, validate_request};

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn response(query: &str, result: std::result::Result<Payload, OaiError>) -> OaiResponse {
        let args = QueryArguments::parse(Some(query), None).unwrap();
        OaiResponse {
            request: Some(validate_request(&args).unwrap()),
            result,
        }
    }

    #[test]
    fn test_render_bad_verb() {
        let xml = render(
            &OaiResponse::rejected(OaiError::BadVerb("The verb argument is missing".to_string())),
            "http://repo.example.org/oai",
            date(),
        )
        .unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<responseDate>2024-03-01T08:00:00Z</responseDate>"));
        assert!(xml.contains("<request>http://repo.example.org/oai</request>"));
        assert!(xml.contains("<error code=\"badVerb\">The verb argument is missing</error>"));
    }

    #[test]
    fn test_render_identify() {
        let identity = Identity {
            repository_name: "Tom & Jerry Archive".to_string(),
            base_url: "http://repo.example.org/oai".to_string(),
            protocol_version: "2.0",
            admin_email: "admin@example.org".to_string(),
            earliest_datestamp: "2020-01-01".to_string(),
            deleted_record: "no",
            granularity: Granularity::Day,
        };
        let xml = render(
            &response("verb=Identify", Ok(Payload::Identify(identity))),
            "http://repo.example.org/oai",
            date(),
        )
        .unwrap();

        assert!(xml.contains("<request verb=\"Identify\">http://repo.example.org/oai</request>"));
        assert!(xml.contains("<repositoryName>Tom &amp; Jerry Archive</repositoryName>"));
        assert!(xml.contains("<granularity>YYYY-MM-DD</granularity>"));
        assert!(xml.contains("<deletedRecord>no</deletedRecord>"));
    }

    #[test]
    fn test_render_list_identifiers_with_token() {
        let page = Page {
            items: vec![Header {
                identifier: "oai:repo:42".to_string(),
                datestamp: "2024-01-01".to_string(),
                set_specs: vec!["physics".to_string()],
            }],
            resumption: Some(Resumption {
                token: Some("0123456789abcdef0123456789abcdef".to_string()),
                cursor: 0,
                complete_list_size: 2,
                expiration_date: Some(date()),
            }),
        };
        let xml = render(
            &response(
                "verb=ListIdentifiers&metadataPrefix=oai_dc&set=physics",
                Ok(Payload::ListIdentifiers(page)),
            ),
            "http://repo.example.org/oai",
            date(),
        )
        .unwrap();

        assert!(xml.contains(
            "<request verb=\"ListIdentifiers\" metadataPrefix=\"oai_dc\" set=\"physics\">"
        ));
        assert!(xml.contains(
            "<header><identifier>oai:repo:42</identifier><datestamp>2024-01-01</datestamp><setSpec>physics</setSpec></header>"
        ));
        assert!(xml.contains(
            "<resumptionToken expirationDate=\"2024-03-01T08:00:00Z\" completeListSize=\"2\" cursor=\"0\">0123456789abcdef0123456789abcdef</resumptionToken>"
        ));
    }

    #[test]
    fn test_render_last_page_token() {
        let page: Page<RecordSet> = Page {
            items: vec![RecordSet {
                spec: "math".to_string(),
                name: "Mathematics".to_string(),
                description: Some("Numbers".to_string()),
            }],
            resumption: Some(Resumption {
                token: None,
                cursor: 1,
                complete_list_size: 2,
                expiration_date: None,
            }),
        };
        let xml = render(
            &response(
                "verb=ListSets&resumptionToken=0123456789abcdef0123456789abcdef",
                Ok(Payload::ListSets(page)),
            ),
            "http://repo.example.org/oai",
            date(),
        )
        .unwrap();

        assert!(xml.contains("<setSpec>math</setSpec><setName>Mathematics</setName>"));
        assert!(xml.contains("<dc:description>Numbers</dc:description>"));
        assert!(xml.contains("<resumptionToken completeListSize=\"2\" cursor=\"1\"/>"));
    }

    #[test]
    fn test_render_record_metadata() {
        let view = RecordView {
            header: Header {
                identifier: "oai:repo:42".to_string(),
                datestamp: "2024-01-01T00:00:00Z".to_string(),
                set_specs: vec![],
            },
            metadata: DublinCore::new()
                .with(DcElement::Title, "Answer <42>")
                .with(DcElement::Subject, "life"),
        };
        let xml = render(
            &response(
                "verb=GetRecord&identifier=oai:repo:42&metadataPrefix=oai_dc",
                Ok(Payload::GetRecord(view)),
            ),
            "http://repo.example.org/oai",
            date(),
        )
        .unwrap();

        assert!(xml.contains("<GetRecord><record><header>"));
        assert!(xml.contains("xmlns:oai_dc=\"http://www.openarchives.org/OAI/2.0/oai_dc/\""));
        assert!(xml.contains("<dc:title>Answer &lt;42&gt;</dc:title><dc:subject>life</dc:subject>"));
    }

    #[test]
    fn test_bad_argument_hides_request_attributes() {
        let xml = render(
            &response(
                "verb=ListRecords&metadataPrefix=oai_dc&from=2024-01-01&until=2023-01-01",
                Err(OaiError::BadArgument("inverted range".to_string())),
            ),
            "http://repo.example.org/oai",
            date(),
        )
        .unwrap();
        assert!(xml.contains("<request>http://repo.example.org/oai</request>"));
        assert!(xml.contains("<error code=\"badArgument\">inverted range</error>"));
    }
}
