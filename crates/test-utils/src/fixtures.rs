//! Capability documents and endpoints used across the workspace tests.
//!
//! The documents are small but structurally faithful: nested and unnamed
//! layer groups, inherited CRS lists, unknown CRS codes, north-east bounding
//! boxes, periodic TIME dimensions and both WMTS request encodings.

/// Common endpoints.
pub mod urls {
    pub const WMS_ENDPOINT: &str = "http://maps.example.com/wms";
    pub const LEGACY_WMS_ENDPOINT: &str = "http://legacy.example.com/cgi-bin/wms";
    pub const WMTS_ENDPOINT: &str = "http://tiles.example.com/wmts";
    pub const STATIC_WMTS_DOCUMENT: &str = "http://tiles.example.com/1.0.0/WMTSCapabilities.xml";
}

/// Common bounding boxes as `[min_x, min_y, max_x, max_y]`.
pub mod bbox {
    /// Global lon/lat extent
    pub const GLOBAL: [f64; 4] = [-180.0, -90.0, 180.0, 90.0];

    /// Extent of `topp:states` in lon/lat
    pub const STATES: [f64; 4] = [-124.73, 24.96, -66.97, 49.37];

    /// Extent of `nexrad` in lon/lat
    pub const NEXRAD: [f64; 4] = [-126.0, 24.0, -66.0, 50.0];

    /// Extent of `radar` in EPSG:3857 meters
    pub const RADAR_MERCATOR: [f64; 4] = [-13884991.0, 2870341.0, -7455066.0, 6338219.0];

    /// Lon/lat window over the Great Lakes
    pub const GREAT_LAKES: [f64; 4] = [-93.0, 40.0, -75.0, 50.0];
}

/// WMS 1.3.0 document served at [`urls::WMS_ENDPOINT`].
///
/// Layers: unnamed root, `topp:states` (TIME, two styles, CRS:84 added),
/// its child `topp:counties` (ELEVATION), and `radar` under an unnamed group.
pub const WMS_130_CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms" xmlns:xlink="http://www.w3.org/1999/xlink">
  <Service>
    <Name>WMS</Name>
    <Title>Demo Map Server</Title>
    <Abstract>Fixture for capability negotiation tests</Abstract>
    <KeywordList><Keyword>demo</Keyword><Keyword>population</Keyword></KeywordList>
    <OnlineResource xlink:type="simple" xlink:href="http://maps.example.com/"/>
  </Service>
  <Capability>
    <Request>
      <GetCapabilities>
        <Format>text/xml</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:type="simple" xlink:href="http://maps.example.com/wms?map=demo"/></Get></HTTP></DCPType>
      </GetCapabilities>
      <GetMap>
        <Format>image/png</Format>
        <Format>image/jpeg</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:type="simple" xlink:href="http://maps.example.com/wms?map=demo"/></Get></HTTP></DCPType>
      </GetMap>
      <GetFeatureInfo>
        <Format>text/html</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:type="simple" xlink:href="http://maps.example.com/wms?map=demo"/></Get></HTTP></DCPType>
      </GetFeatureInfo>
    </Request>
    <Layer>
      <Title>Demo layers</Title>
      <CRS>EPSG:4326</CRS>
      <CRS>EPSG:3857</CRS>
      <CRS>EPSG:32633</CRS>
      <EX_GeographicBoundingBox>
        <westBoundLongitude>-180</westBoundLongitude>
        <eastBoundLongitude>180</eastBoundLongitude>
        <southBoundLatitude>-90</southBoundLatitude>
        <northBoundLatitude>90</northBoundLatitude>
      </EX_GeographicBoundingBox>
      <BoundingBox CRS="EPSG:4326" minx="-90" miny="-180" maxx="90" maxy="180"/>
      <Attribution>
        <Title>Example Org</Title>
        <OnlineResource xlink:type="simple" xlink:href="http://example.org/"/>
      </Attribution>
      <Layer queryable="1">
        <Name>topp:states</Name>
        <Title>USA Population</Title>
        <Abstract>Population per state</Abstract>
        <KeywordList><Keyword>census</Keyword></KeywordList>
        <CRS>CRS:84</CRS>
        <EX_GeographicBoundingBox>
          <westBoundLongitude>-124.73</westBoundLongitude>
          <eastBoundLongitude>-66.97</eastBoundLongitude>
          <southBoundLatitude>24.96</southBoundLatitude>
          <northBoundLatitude>49.37</northBoundLatitude>
        </EX_GeographicBoundingBox>
        <BoundingBox CRS="EPSG:4326" minx="24.96" miny="-124.73" maxx="49.37" maxy="-66.97"/>
        <MetadataURL type="FGDC"><Format>text/xml</Format><OnlineResource xlink:type="simple" xlink:href="http://maps.example.com/meta/states.xml"/></MetadataURL>
        <Dimension name="time" units="ISO8601" default="2020-01-03T00:00:00Z">2020-01-01/2020-01-03/P1D</Dimension>
        <Style>
          <Name>population</Name>
          <Title>Population</Title>
          <LegendURL width="20" height="20">
            <Format>image/png</Format>
            <OnlineResource xlink:type="simple" xlink:href="http://maps.example.com/legend/population.png"/>
          </LegendURL>
        </Style>
        <Style>
          <Name>outline</Name>
          <Title>Outline</Title>
        </Style>
        <Layer opaque="1">
          <Name>topp:counties</Name>
          <Title>US Counties</Title>
          <Dimension name="elevation" units="m" default="0">0,500,1000</Dimension>
        </Layer>
      </Layer>
      <Layer>
        <Title>Weather</Title>
        <Layer>
          <Name>radar</Name>
          <Title>Radar mosaic</Title>
          <BoundingBox CRS="EPSG:3857" minx="-13884991" miny="2870341" maxx="-7455066" maxy="6338219"/>
          <MinScaleDenominator>1000</MinScaleDenominator>
          <MaxScaleDenominator>50000000</MaxScaleDenominator>
        </Layer>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>
"#;

/// WMS 1.1.1 document served at [`urls::LEGACY_WMS_ENDPOINT`].
///
/// `nexrad` declares TIME through an `Extent` whose units come from the
/// parent's `Dimension`. GetMap is served by two hosts.
pub const WMS_111_CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE WMT_MS_Capabilities SYSTEM "http://schemas.opengis.net/wms/1.1.1/WMS_MS_Capabilities.dtd">
<WMT_MS_Capabilities version="1.1.1">
  <Service>
    <Name>OGC:WMS</Name>
    <Title>Legacy Radar Server</Title>
    <OnlineResource xmlns:xlink="http://www.w3.org/1999/xlink" xlink:href="http://legacy.example.com/"/>
  </Service>
  <Capability>
    <Request>
      <GetCapabilities>
        <Format>application/vnd.ogc.wms_xml</Format>
        <DCPType><HTTP><Get><OnlineResource xmlns:xlink="http://www.w3.org/1999/xlink" xlink:type="simple" xlink:href="http://legacy.example.com/cgi-bin/wms?"/></Get></HTTP></DCPType>
      </GetCapabilities>
      <GetMap>
        <Format>image/gif</Format>
        <Format>image/png</Format>
        <DCPType><HTTP><Get><OnlineResource xmlns:xlink="http://www.w3.org/1999/xlink" xlink:type="simple" xlink:href="http://legacy.example.com/cgi-bin/wms?"/></Get></HTTP></DCPType>
        <DCPType><HTTP><Get><OnlineResource xmlns:xlink="http://www.w3.org/1999/xlink" xlink:type="simple" xlink:href="http://legacy2.example.com/cgi-bin/wms?"/></Get></HTTP></DCPType>
      </GetMap>
    </Request>
    <Layer>
      <Title>Legacy root</Title>
      <SRS>EPSG:4326 EPSG:900913</SRS>
      <LatLonBoundingBox minx="-180" miny="-90" maxx="180" maxy="90"/>
      <Dimension name="time" units="ISO8601"/>
      <Layer queryable="0">
        <Name>nexrad</Name>
        <Title>NEXRAD base reflectivity</Title>
        <SRS>EPSG:4269</SRS>
        <LatLonBoundingBox minx="-126" miny="24" maxx="-66" maxy="50"/>
        <BoundingBox SRS="EPSG:4326" minx="-126" miny="24" maxx="-66" maxy="50"/>
        <Extent name="time" default="2021-06-01T01:00:00Z">2021-06-01T00:00:00Z,2021-06-01T01:00:00Z</Extent>
        <Style><Name>default</Name><Title>Default</Title></Style>
      </Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>
"#;

/// WMTS 1.0.0 document served at [`urls::WMTS_ENDPOINT`] with KVP encoding.
///
/// One layer, `bluemarble`, linked to a Web Mercator and a north-east
/// EPSG:4326 tile matrix set.
pub const WMTS_CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Capabilities xmlns="http://www.opengis.net/wmts/1.0" xmlns:ows="http://www.opengis.net/ows/1.1" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.0.0">
  <ows:ServiceIdentification>
    <ows:Title>Demo Tile Server</ows:Title>
    <ows:Abstract>Fixture for WMTS tests</ows:Abstract>
    <ows:Keywords><ows:Keyword>imagery</ows:Keyword></ows:Keywords>
    <ows:ServiceType>OGC WMTS</ows:ServiceType>
    <ows:ServiceTypeVersion>1.0.0</ows:ServiceTypeVersion>
  </ows:ServiceIdentification>
  <ows:OperationsMetadata>
    <ows:Operation name="GetCapabilities">
      <ows:DCP>
        <ows:HTTP>
          <ows:Get xlink:href="http://tiles.example.com/wmts?">
            <ows:Constraint name="GetEncoding">
              <ows:AllowedValues><ows:Value>KVP</ows:Value></ows:AllowedValues>
            </ows:Constraint>
          </ows:Get>
        </ows:HTTP>
      </ows:DCP>
    </ows:Operation>
    <ows:Operation name="GetTile">
      <ows:DCP>
        <ows:HTTP>
          <ows:Get xlink:href="http://tiles.example.com/wmts?">
            <ows:Constraint name="GetEncoding">
              <ows:AllowedValues><ows:Value>KVP</ows:Value></ows:AllowedValues>
            </ows:Constraint>
          </ows:Get>
        </ows:HTTP>
      </ows:DCP>
    </ows:Operation>
  </ows:OperationsMetadata>
  <Contents>
    <Layer>
      <ows:Title>Blue Marble</ows:Title>
      <ows:WGS84BoundingBox>
        <ows:LowerCorner>-180 -85</ows:LowerCorner>
        <ows:UpperCorner>180 85</ows:UpperCorner>
      </ows:WGS84BoundingBox>
      <ows:Identifier>bluemarble</ows:Identifier>
      <Style>
        <ows:Identifier>night</ows:Identifier>
        <ows:Title>Night lights</ows:Title>
      </Style>
      <Style isDefault="true">
        <ows:Identifier>default</ows:Identifier>
        <ows:Title>Default</ows:Title>
        <LegendURL format="image/png" xlink:href="http://tiles.example.com/legend/bluemarble.png"/>
      </Style>
      <Format>image/jpeg</Format>
      <Format>image/png</Format>
      <Dimension>
        <ows:Identifier>Time</ows:Identifier>
        <ows:UOM>ISO8601</ows:UOM>
        <Default>2020-01-02T00:00:00Z</Default>
        <Value>2020-01-01/2020-01-02/P1D</Value>
        <Value>2020-02-01T00:00:00Z</Value>
      </Dimension>
      <TileMatrixSetLink><TileMatrixSet>GoogleMapsCompatible</TileMatrixSet></TileMatrixSetLink>
      <TileMatrixSetLink><TileMatrixSet>EPSG4326</TileMatrixSet></TileMatrixSetLink>
      <ResourceURL format="image/jpeg" resourceType="tile" template="http://tiles.example.com/wmts/bluemarble/{Style}/{Time}/{TileMatrixSet}/{TileMatrix}/{TileRow}/{TileCol}.jpg"/>
    </Layer>
    <TileMatrixSet>
      <ows:Identifier>GoogleMapsCompatible</ows:Identifier>
      <ows:SupportedCRS>urn:ogc:def:crs:EPSG::3857</ows:SupportedCRS>
      <WellKnownScaleSet>urn:ogc:def:wkss:OGC:1.0:GoogleMapsCompatible</WellKnownScaleSet>
      <TileMatrix>
        <ows:Identifier>0</ows:Identifier>
        <ScaleDenominator>559082264.0287178</ScaleDenominator>
        <TopLeftCorner>-20037508.3427892 20037508.3427892</TopLeftCorner>
        <TileWidth>256</TileWidth>
        <TileHeight>256</TileHeight>
        <MatrixWidth>1</MatrixWidth>
        <MatrixHeight>1</MatrixHeight>
      </TileMatrix>
      <TileMatrix>
        <ows:Identifier>1</ows:Identifier>
        <ScaleDenominator>279541132.0143589</ScaleDenominator>
        <TopLeftCorner>-20037508.3427892 20037508.3427892</TopLeftCorner>
        <TileWidth>256</TileWidth>
        <TileHeight>256</TileHeight>
        <MatrixWidth>2</MatrixWidth>
        <MatrixHeight>2</MatrixHeight>
      </TileMatrix>
    </TileMatrixSet>
    <TileMatrixSet>
      <ows:Identifier>EPSG4326</ows:Identifier>
      <ows:SupportedCRS>urn:ogc:def:crs:EPSG::4326</ows:SupportedCRS>
      <TileMatrix>
        <ows:Identifier>0</ows:Identifier>
        <ScaleDenominator>279541132.0143589</ScaleDenominator>
        <TopLeftCorner>90 -180</TopLeftCorner>
        <TileWidth>256</TileWidth>
        <TileHeight>256</TileHeight>
        <MatrixWidth>2</MatrixWidth>
        <MatrixHeight>1</MatrixHeight>
      </TileMatrix>
    </TileMatrixSet>
  </Contents>
</Capabilities>
"#;

/// The WMTS document advertising only the RESTful encoding.
pub fn wmts_rest_only_capabilities() -> String {
    WMTS_CAPABILITIES.replace("<ows:Value>KVP</ows:Value>", "<ows:Value>RESTful</ows:Value>")
}

/// A proxy error page returned with status 200.
pub const HTML_ERROR_PAGE: &str =
    "<html><head><title>Gateway</title></head><body>Upstream unavailable</body></html>";

/// An OWS exception report, as returned for an unsupported version.
pub const SERVICE_EXCEPTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceExceptionReport version="1.1.1">
  <ServiceException code="InvalidFormat">Unsupported VERSION</ServiceException>
</ServiceExceptionReport>
"#;
