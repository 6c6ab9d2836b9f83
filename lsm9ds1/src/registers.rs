macro_rules! registers {
    (
        $enum_name:ident, $slice_name:ident {
            $($name:ident = $val:expr),* $(,)?
        }
    ) => {
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub enum $enum_name {
            $($name = $val),*
        }

        pub const $slice_name: &[$enum_name] = &[
            $($enum_name::$name),*
        ];

        impl $enum_name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($enum_name::$name => stringify!($name),)*
                }
            }
        }

        impl Register for $enum_name {
            fn addr(self) -> u8 {
                self as u8
            }
        }

        impl NamedRegister for $enum_name {
            fn name(&self) -> &'static str {
                self.name()
            }
        }

        impl From<$enum_name> for u8 {
            fn from(r: $enum_name) -> u8 {
                r as u8
            }
        }
    };
}

pub trait NamedRegister: Register {
    fn name(&self) -> &'static str;
}

pub trait Register: Copy {
    fn addr(self) -> u8;
}

/// One control register write of an init sequence.
pub struct RegConfig<R: Register> {
    pub reg: R,
    pub value: u8,
}

/// Bus address of the accelerometer/gyroscope die.
pub const ACCEL_ADDRESS: u8 = 0x6A;
/// Bus address of the magnetometer die.
pub const MAG_ADDRESS: u8 = 0x1C;

pub const ACCEL_WHO_AM_I_VALUE: u8 = 0x68;
pub const MAG_WHO_AM_I_VALUE: u8 = 0x3D;

registers! {
    AccelReg, ACCEL_REGS {
        WhoAmI = 0x0F,
        CtrlReg6Xl = 0x20,
        CtrlReg7Xl = 0x21,
        CtrlReg8 = 0x22,
        StatusReg = 0x27,
        OutXLXl = 0x28,
        OutXHXl = 0x29,
        OutYLXl = 0x2A,
        OutYHXl = 0x2B,
        OutZLXl = 0x2C,
        OutZHXl = 0x2D,
    }
}

registers! {
    MagReg, MAG_REGS {
        WhoAmI = 0x0F,
        CtrlReg1M = 0x20,
        CtrlReg2M = 0x21,
        CtrlReg3M = 0x22,
        CtrlReg4M = 0x23,
        CtrlReg5M = 0x24,
        StatusRegM = 0x27,
        OutXLM = 0x28,
        OutXHM = 0x29,
        OutYLM = 0x2A,
        OutYHM = 0x2B,
        OutZLM = 0x2C,
        OutZHM = 0x2D,
    }
}

/* CTRL_REG6_XL
 * B7    B6    B5    B4    B3    B2     B1    B0
 * ODR2  ODR1  ODR0  FS1   FS0   BW_SCAL BW1  BW0
*/
pub const XL_ODR_LOC: u8 = 5;
#[repr(u8)]
pub enum XlOdr {
    PowerDown = 0,
    Hz10 = 1,
    Hz50 = 2,
    Hz119 = 3,
    Hz238 = 4,
    Hz476 = 5,
    Hz952 = 6,
}

pub const XL_FS_LOC: u8 = 3;
#[repr(u8)]
pub enum XlFullScale {
    G2 = 0,
    G16 = 1,
    G4 = 2,
    G8 = 3,
}

/* CTRL_REG1_M
 * B7        B6   B5   B4   B3   B2   B1       B0
 * TEMP_COMP OM1  OM0  DO2  DO1  DO0  FAST_ODR ST
*/
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CtrlReg1MFlags: u8 {
        const TEMP_COMP = 1 << 7;
        const FAST_ODR  = 1 << 1;
        const ST        = 1 << 0;
    }
}

pub const MAG_OM_LOC: u8 = 5;
#[repr(u8)]
pub enum MagOM {
    LowPowerMode = 0,
    MedPerformanceMode = 1,
    HighPerformanceMode = 2,
    UltraPerformanceMode = 3,
}

pub const MAG_DO_LOC: u8 = 2;
#[repr(u8)]
pub enum MagOdr {
    Hz0_625 = 0,
    Hz1_25 = 1,
    Hz2_5 = 2,
    Hz5 = 3,
    Hz10 = 4,
    Hz20 = 5,
    Hz40 = 6,
    Hz80 = 7,
}

/* CTRL_REG2_M
 * B7   B6   B5   B4   B3     B2       B1   B0
 * 0    FS1  FS0  0    REBOOT SOFT_RST 0    0
*/
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CtrlReg2MFlags: u8 {
        const REBOOT   = 1 << 3;
        const SOFT_RST = 1 << 2;
    }
}

pub const MAG_FS_LOC: u8 = 5;
#[repr(u8)]
pub enum MagFullScale {
    Gauss4 = 0,
    Gauss8 = 1,
    Gauss12 = 2,
    Gauss16 = 3,
}

/* CTRL_REG3_M
 * B7          B6  B5 B4 B3 B2  B1  B0
 * I2C_DISABLE 0   LP 0  0  SIM MD1 MD0
*/
#[repr(u8)]
pub enum MagConvMode {
    Continuous = 0,
    SingleConv = 1,
    PowerDown = 2,
}
