//! Well-known field names of the county sales file.

/// Neighborhood code.
pub const NBHC: &str = "NBHC";
/// Sale date, `YYYYMMDD` text.
pub const S_DATE: &str = "S_DATE";
/// Qualified / unqualified flag.
pub const QU: &str = "QU";
/// Sale amount.
pub const S_AMT: &str = "S_AMT";
/// Vacant / improved flag.
pub const VI: &str = "VI";
/// Buyer name.
pub const GRANTEE: &str = "GRANTEE";
/// Seller name.
pub const GRANTOR: &str = "GRANTOR";
/// Property identification number.
pub const PIN: &str = "PIN";
/// Folio number.
pub const FOLIO: &str = "FOLIO";
/// Reason code.
pub const REA_CD: &str = "REA_CD";

/// `QU` value marking an arm's-length sale.
pub const QUALIFIED: &str = "Q";

/// Human description of a well-known field, or `None` for other fields.
pub fn field_description(name: &str) -> Option<&'static str> {
    let description = match name {
        PIN => "Property Identification Number\nUnique ID for the parcel.",
        FOLIO => "Folio Number\nAlternative ID used by County.",
        "DOR_CODE" => "Dept. of Revenue Code\nUse Code (e.g., 0100 = SF Residential).",
        NBHC => "Neighborhood Code\nAppraisal neighborhood ID.",
        S_DATE => "Sale Date\nYYYYMMDD format.",
        VI => "Vacant / Improved\nV = Vacant Land\nI = Improved (Building)",
        QU => {
            "Qualified / Unqualified\nQ = Arm's Length (Market Value)\n\
             U = Unqualified (e.g. Foreclosure, Family Transfer)"
        }
        REA_CD => "Reason Code\nWhy sale is qualified/unqualified.",
        S_AMT => "Sale Amount\nPrice stored in county records.",
        "SUB" => "Subdivision Code",
        "STR" => "Section-Township-Range",
        "S_TYPE" => "Sale Instrument Type\nWD = Warranty Deed, QC = Quit Claim, etc.",
        "OR_BK" => "Official Record Book",
        "OR_PG" => "Official Record Page",
        GRANTOR => "Seller Name",
        GRANTEE => "Buyer Name",
        "DOC_NUM" => "Document Number",
        _ => return None,
    };
    Some(description)
}
